//! JSON 字符串字面量转义（只处理 `\`、`"`、换行与制表符）

pub fn escape_json(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 8);
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_each_special_character_once() {
        assert_eq!(escape_json(r"a\b"), r"a\\b");
        assert_eq!(escape_json("say \"hi\""), r#"say \"hi\""#);
        assert_eq!(escape_json("l1\nl2"), r"l1\nl2");
        assert_eq!(escape_json("c1\tc2"), r"c1\tc2");
    }

    #[test]
    fn other_characters_pass_through() {
        assert_eq!(escape_json("héllo / <b> 'x' \u{263a}"), "héllo / <b> 'x' \u{263a}");
    }

    #[test]
    fn not_idempotent() {
        let once = escape_json("\"\n");
        assert_eq!(once, r#"\"\n"#);
        assert_eq!(escape_json(&once), r#"\\\"\\n"#);
    }

    #[test]
    fn json_parser_recovers_the_original() {
        let original = "tab\there \"q\" back\\slash\nnext <b class=\"block_00_0\">x</b>";
        let literal = format!("\"{}\"", escape_json(original));
        let decoded: String = serde_json::from_str(&literal).unwrap();
        assert_eq!(decoded, original);
    }
}
