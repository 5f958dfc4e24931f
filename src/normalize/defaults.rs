//! Built-in correction table for Vietnamese citizen identity cards (CCCD/CMND).

use super::{PatternRule, Replacement, RuleTable};

/// Label misreadings seen in OCR output, mostly lost diacritics
const REPLACEMENTS: &[(&str, &str)] = &[
    ("CONG HOA XA HOI CHU NGHIA VIET NAM", "CỘNG HÒA XÃ HỘI CHỦ NGHĨA VIỆT NAM"),
    ("CỘNG HOÀ XÃ HỘI CHỦ NGHĨA VIỆT NAM", "CỘNG HÒA XÃ HỘI CHỦ NGHĨA VIỆT NAM"),
    ("Doc lap - Tu do - Hanh phuc", "Độc lập - Tự do - Hạnh phúc"),
    ("CAN CUOC CONG DAN", "CĂN CƯỚC CÔNG DÂN"),
    ("CĂN CUỚC", "CĂN CƯỚC"),
    ("CĂN CUỐC", "CĂN CƯỚC"),
    ("CAN CƯỚC", "CĂN CƯỚC"),
    ("CHUNG MINH NHAN DAN", "CHỨNG MINH NHÂN DÂN"),
    ("Sô /", "Số /"),
    ("Sô:", "Số:"),
    ("Ho va ten", "Họ và tên"),
    ("Ho và tên", "Họ và tên"),
    ("Họ va tên", "Họ và tên"),
    ("Ngay, thang, nam sinh", "Ngày, tháng, năm sinh"),
    ("Ngay sinh", "Ngày sinh"),
    ("Gioi tinh", "Giới tính"),
    ("Quoc tich", "Quốc tịch"),
    ("Que quan", "Quê quán"),
    ("Nguyen quan", "Nguyên quán"),
    ("Noi thuong tru", "Nơi thường trú"),
    ("Noi DKHK thuong tru", "Nơi ĐKHK thường trú"),
    ("Co gia tri den", "Có giá trị đến"),
    ("Dan toc", "Dân tộc"),
    ("Ton giao", "Tôn giáo"),
];

/// Whitespace cleanup, applied after the literal fixes
const PATTERNS: &[(&str, &str)] = &[
    // CRLF and lone CR
    (r"\r\n?", "\n"),
    (r"[ \t\x{A0}]+", " "),
    (r" *\n *", "\n"),
    // "Quốc tịch :" -> "Quốc tịch:"
    (r" +:", ":"),
    (r"\n{3,}", "\n\n"),
];

pub(super) fn table() -> RuleTable {
    RuleTable {
        replacements: REPLACEMENTS
            .iter()
            .map(|(find, replace)| Replacement {
                find: find.to_string(),
                replace: replace.to_string(),
            })
            .collect(),
        patterns: PATTERNS
            .iter()
            .map(|(pattern, replace)| PatternRule {
                pattern: pattern.to_string(),
                replace: replace.to_string(),
            })
            .collect(),
    }
}
