use std::fmt;

/// The atomic type tag a schema can declare for a flag or field value.
///
/// This is the declared, lexical-space type; the runtime item produced by
/// atomizing a bound value is chosen from this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    String,
    Boolean,
    Integer,
    NonNegativeInteger,
    PositiveInteger,
    Decimal,
    Date,
    DateTime,
    Time,
    DayTimeDuration,
    YearMonthDuration,
    Uri,
    UriReference,
    Base64,
    Token,
    NcName,
    UntypedAtomic,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::Integer => "integer",
            DataType::NonNegativeInteger => "non-negative-integer",
            DataType::PositiveInteger => "positive-integer",
            DataType::Decimal => "decimal",
            DataType::Date => "date",
            DataType::DateTime => "date-time",
            DataType::Time => "time",
            DataType::DayTimeDuration => "day-time-duration",
            DataType::YearMonthDuration => "year-month-duration",
            DataType::Uri => "uri",
            DataType::UriReference => "uri-reference",
            DataType::Base64 => "base64",
            DataType::Token => "token",
            DataType::NcName => "ncname",
            DataType::UntypedAtomic => "untyped-atomic",
        }
    }

    /// String-shaped types share the plain string lexical space.
    pub fn is_string_kind(&self) -> bool {
        matches!(
            self,
            DataType::String | DataType::Token | DataType::NcName | DataType::UntypedAtomic
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::Integer
                | DataType::NonNegativeInteger
                | DataType::PositiveInteger
                | DataType::Decimal
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
