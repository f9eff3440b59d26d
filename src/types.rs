use crate::error::ValueError;
use std::fmt;
use std::str::FromStr;

/// Fixed graph color palette. `colorindex` selections wrap around this list
/// so an out-of-range index is never an error.
pub const GRAPH_COLORS: [&str; 15] = [
    "00cc00", "0000ff", "00ffff", "ff0000", "ffff00", "cc0000", "0000cc", "0080c0", "8080c0",
    "ff0080", "800080", "0000a0", "408080", "808000", "000000",
];

/// A normalized hex color. Stored as six lowercase hex digits without the
/// leading `#`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Color(String);

impl Color {
    pub fn new(input: &str) -> Result<Self, ValueError> {
        let hex = input.strip_prefix('#').unwrap_or(input);
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Color(hex.to_ascii_lowercase()))
        } else {
            Err(ValueError::InvalidColor {
                value: input.to_string(),
            })
        }
    }

    /// Selects a palette color by index, modulo the palette length.
    pub fn from_index(index: i64) -> Self {
        let idx = index.rem_euclid(GRAPH_COLORS.len() as i64) as usize;
        Color(GRAPH_COLORS[idx].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Color {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::new(s)
    }
}

/// Round-robin archive type of a datapoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RrdType {
    Counter,
    Gauge,
    Derive,
    Absolute,
}

impl RrdType {
    pub const ALLOWED: &'static str = "COUNTER, GAUGE, DERIVE, ABSOLUTE";

    pub fn as_str(&self) -> &'static str {
        match self {
            RrdType::Counter => "COUNTER",
            RrdType::Gauge => "GAUGE",
            RrdType::Derive => "DERIVE",
            RrdType::Absolute => "ABSOLUTE",
        }
    }
}

impl fmt::Display for RrdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RrdType {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "COUNTER" => Ok(RrdType::Counter),
            "GAUGE" => Ok(RrdType::Gauge),
            "DERIVE" => Ok(RrdType::Derive),
            "ABSOLUTE" => Ok(RrdType::Absolute),
            _ => Err(ValueError::InvalidRrdType {
                value: s.to_string(),
                allowed: Self::ALLOWED.to_string(),
            }),
        }
    }
}

/// Cardinality of a class relationship schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// 1:1
    OneToOne,
    /// 1:M
    OneToMany,
    /// 1:MC (one to many, containing)
    OneToManyCont,
    /// M:M
    ManyToMany,
}

impl Cardinality {
    pub const ALLOWED: &'static str = "1:1, 1:M, 1:MC, M:M";

    pub fn as_str(&self) -> &'static str {
        match self {
            Cardinality::OneToOne => "1:1",
            Cardinality::OneToMany => "1:M",
            Cardinality::OneToManyCont => "1:MC",
            Cardinality::ManyToMany => "M:M",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cardinality {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1:1" => Ok(Cardinality::OneToOne),
            "1:M" => Ok(Cardinality::OneToMany),
            "1:MC" => Ok(Cardinality::OneToManyCont),
            "M:M" => Ok(Cardinality::ManyToMany),
            _ => Err(ValueError::InvalidCardinality {
                value: s.to_string(),
                allowed: Self::ALLOWED.to_string(),
            }),
        }
    }
}
