//! Cat colors: the closed choice set stored on every cat, and the hex-code
//! transform that resolves `#rrggbb` codes to CSS3 color names.

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Database, Decode};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// Message reported when a hex code has no CSS3 name.
pub const NO_COLOR_NAME: &str = "no name exists for this color";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("\"{0}\" is not a valid choice.")]
    NotAChoice(String),
    #[error("no name exists for this color")]
    NoName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatColor {
    Gray,
    Black,
    White,
    Ginger,
    Mixed,
}

impl CatColor {
    pub const ALL: [CatColor; 5] = [
        CatColor::Gray,
        CatColor::Black,
        CatColor::White,
        CatColor::Ginger,
        CatColor::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatColor::Gray => "gray",
            CatColor::Black => "black",
            CatColor::White => "white",
            CatColor::Ginger => "ginger",
            CatColor::Mixed => "mixed",
        }
    }
}

impl fmt::Display for CatColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match against the choice keys.
impl FromStr for CatColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CatColor::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ColorError::NotAChoice(s.to_string()))
    }
}

impl sqlx::Type<Postgres> for CatColor {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Postgres> for CatColor {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        <&str as Encode<Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}

impl<'r> Decode<'r, Postgres> for CatColor {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let s = <&str as Decode<Postgres>>::decode(value)?;
        Ok(s.parse::<CatColor>()?)
    }
}

/// Hex-code color field: outbound values pass through, inbound hex codes are
/// replaced by their CSS3 name.
pub struct HexColor;

impl HexColor {
    pub fn to_representation(value: &str) -> &str {
        value
    }

    pub fn to_internal_value(data: &str) -> Result<String, ColorError> {
        hex_to_name(data)
            .map(str::to_string)
            .ok_or(ColorError::NoName)
    }
}

fn hex_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("static hex pattern")
    })
}

/// Lowercase `#rrggbb`, expanding the three-digit shorthand.
fn normalize_hex(hex: &str) -> Option<String> {
    if !hex_pattern().is_match(hex) {
        return None;
    }
    let digits = hex[1..].to_ascii_lowercase();
    if digits.len() == 3 {
        let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
        Some(format!("#{}", expanded))
    } else {
        Some(format!("#{}", digits))
    }
}

/// CSS3 name for a hex code, or `None` for malformed or unnamed codes.
pub fn hex_to_name(hex: &str) -> Option<&'static str> {
    let normalized = normalize_hex(hex)?;
    CSS3_HEX_TO_NAME
        .iter()
        .find(|(h, _)| *h == normalized)
        .map(|(_, name)| *name)
}

// One name per value. Duplicate CSS3 spellings resolve to "gray" variants,
// "cyan" and "magenta".
const CSS3_HEX_TO_NAME: &[(&str, &str)] = &[
    ("#f0f8ff", "aliceblue"),
    ("#faebd7", "antiquewhite"),
    ("#7fffd4", "aquamarine"),
    ("#f0ffff", "azure"),
    ("#f5f5dc", "beige"),
    ("#ffe4c4", "bisque"),
    ("#000000", "black"),
    ("#ffebcd", "blanchedalmond"),
    ("#0000ff", "blue"),
    ("#8a2be2", "blueviolet"),
    ("#a52a2a", "brown"),
    ("#deb887", "burlywood"),
    ("#5f9ea0", "cadetblue"),
    ("#7fff00", "chartreuse"),
    ("#d2691e", "chocolate"),
    ("#ff7f50", "coral"),
    ("#6495ed", "cornflowerblue"),
    ("#fff8dc", "cornsilk"),
    ("#dc143c", "crimson"),
    ("#00ffff", "cyan"),
    ("#00008b", "darkblue"),
    ("#008b8b", "darkcyan"),
    ("#b8860b", "darkgoldenrod"),
    ("#a9a9a9", "darkgray"),
    ("#006400", "darkgreen"),
    ("#bdb76b", "darkkhaki"),
    ("#8b008b", "darkmagenta"),
    ("#556b2f", "darkolivegreen"),
    ("#ff8c00", "darkorange"),
    ("#9932cc", "darkorchid"),
    ("#8b0000", "darkred"),
    ("#e9967a", "darksalmon"),
    ("#8fbc8f", "darkseagreen"),
    ("#483d8b", "darkslateblue"),
    ("#2f4f4f", "darkslategray"),
    ("#00ced1", "darkturquoise"),
    ("#9400d3", "darkviolet"),
    ("#ff1493", "deeppink"),
    ("#00bfff", "deepskyblue"),
    ("#696969", "dimgray"),
    ("#1e90ff", "dodgerblue"),
    ("#b22222", "firebrick"),
    ("#fffaf0", "floralwhite"),
    ("#228b22", "forestgreen"),
    ("#dcdcdc", "gainsboro"),
    ("#f8f8ff", "ghostwhite"),
    ("#ffd700", "gold"),
    ("#daa520", "goldenrod"),
    ("#808080", "gray"),
    ("#008000", "green"),
    ("#adff2f", "greenyellow"),
    ("#f0fff0", "honeydew"),
    ("#ff69b4", "hotpink"),
    ("#cd5c5c", "indianred"),
    ("#4b0082", "indigo"),
    ("#fffff0", "ivory"),
    ("#f0e68c", "khaki"),
    ("#e6e6fa", "lavender"),
    ("#fff0f5", "lavenderblush"),
    ("#7cfc00", "lawngreen"),
    ("#fffacd", "lemonchiffon"),
    ("#add8e6", "lightblue"),
    ("#f08080", "lightcoral"),
    ("#e0ffff", "lightcyan"),
    ("#fafad2", "lightgoldenrodyellow"),
    ("#d3d3d3", "lightgray"),
    ("#90ee90", "lightgreen"),
    ("#ffb6c1", "lightpink"),
    ("#ffa07a", "lightsalmon"),
    ("#20b2aa", "lightseagreen"),
    ("#87cefa", "lightskyblue"),
    ("#778899", "lightslategray"),
    ("#b0c4de", "lightsteelblue"),
    ("#ffffe0", "lightyellow"),
    ("#00ff00", "lime"),
    ("#32cd32", "limegreen"),
    ("#faf0e6", "linen"),
    ("#ff00ff", "magenta"),
    ("#800000", "maroon"),
    ("#66cdaa", "mediumaquamarine"),
    ("#0000cd", "mediumblue"),
    ("#ba55d3", "mediumorchid"),
    ("#9370db", "mediumpurple"),
    ("#3cb371", "mediumseagreen"),
    ("#7b68ee", "mediumslateblue"),
    ("#00fa9a", "mediumspringgreen"),
    ("#48d1cc", "mediumturquoise"),
    ("#c71585", "mediumvioletred"),
    ("#191970", "midnightblue"),
    ("#f5fffa", "mintcream"),
    ("#ffe4e1", "mistyrose"),
    ("#ffe4b5", "moccasin"),
    ("#ffdead", "navajowhite"),
    ("#000080", "navy"),
    ("#fdf5e6", "oldlace"),
    ("#808000", "olive"),
    ("#6b8e23", "olivedrab"),
    ("#ffa500", "orange"),
    ("#ff4500", "orangered"),
    ("#da70d6", "orchid"),
    ("#eee8aa", "palegoldenrod"),
    ("#98fb98", "palegreen"),
    ("#afeeee", "paleturquoise"),
    ("#db7093", "palevioletred"),
    ("#ffefd5", "papayawhip"),
    ("#ffdab9", "peachpuff"),
    ("#cd853f", "peru"),
    ("#ffc0cb", "pink"),
    ("#dda0dd", "plum"),
    ("#b0e0e6", "powderblue"),
    ("#800080", "purple"),
    ("#ff0000", "red"),
    ("#bc8f8f", "rosybrown"),
    ("#4169e1", "royalblue"),
    ("#8b4513", "saddlebrown"),
    ("#fa8072", "salmon"),
    ("#f4a460", "sandybrown"),
    ("#2e8b57", "seagreen"),
    ("#fff5ee", "seashell"),
    ("#a0522d", "sienna"),
    ("#c0c0c0", "silver"),
    ("#87ceeb", "skyblue"),
    ("#6a5acd", "slateblue"),
    ("#708090", "slategray"),
    ("#fffafa", "snow"),
    ("#00ff7f", "springgreen"),
    ("#4682b4", "steelblue"),
    ("#d2b48c", "tan"),
    ("#008080", "teal"),
    ("#d8bfd8", "thistle"),
    ("#ff6347", "tomato"),
    ("#40e0d0", "turquoise"),
    ("#ee82ee", "violet"),
    ("#f5deb3", "wheat"),
    ("#ffffff", "white"),
    ("#f5f5f5", "whitesmoke"),
    ("#ffff00", "yellow"),
    ("#9acd32", "yellowgreen"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_keys_are_exact() {
        assert_eq!("black".parse::<CatColor>(), Ok(CatColor::Black));
        assert_eq!("ginger".parse::<CatColor>(), Ok(CatColor::Ginger));
        assert_eq!(
            "ultraviolet".parse::<CatColor>(),
            Err(ColorError::NotAChoice("ultraviolet".into()))
        );
        assert!("Black".parse::<CatColor>().is_err());
    }

    #[test]
    fn choice_serializes_as_key() {
        assert_eq!(serde_json::to_value(CatColor::Mixed).unwrap(), serde_json::json!("mixed"));
        for c in CatColor::ALL {
            assert_eq!(c.as_str().parse::<CatColor>(), Ok(c));
        }
    }

    #[test]
    fn hex_resolves_to_css3_name() {
        assert_eq!(hex_to_name("#000000"), Some("black"));
        assert_eq!(hex_to_name("#FFF"), Some("white"));
        assert_eq!(hex_to_name("#FfA500"), Some("orange"));
        assert_eq!(hex_to_name("#808080"), Some("gray"));
        assert_eq!(hex_to_name("#2F4F4F"), Some("darkslategray"));
        assert_eq!(hex_to_name("#0ff"), Some("cyan"));
        assert_eq!(hex_to_name("#ff00ff"), Some("magenta"));
    }

    #[test]
    fn hex_without_name_or_malformed() {
        assert_eq!(hex_to_name("#123456"), None);
        assert_eq!(hex_to_name("000000"), None);
        assert_eq!(hex_to_name("#00000"), None);
        assert_eq!(hex_to_name("#gggggg"), None);
    }

    #[test]
    fn hex_field_transform() {
        assert_eq!(HexColor::to_representation("#123456"), "#123456");
        assert_eq!(HexColor::to_internal_value("#FF0000").as_deref(), Ok("red"));
        let err = HexColor::to_internal_value("#123456").unwrap_err();
        assert_eq!(err, ColorError::NoName);
        assert_eq!(err.to_string(), NO_COLOR_NAME);
    }

    #[test]
    fn table_has_one_name_per_value() {
        let mut hexes: Vec<&str> = CSS3_HEX_TO_NAME.iter().map(|(h, _)| *h).collect();
        let total = hexes.len();
        hexes.sort_unstable();
        hexes.dedup();
        assert_eq!(hexes.len(), total);
    }
}
