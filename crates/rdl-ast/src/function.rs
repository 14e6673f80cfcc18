//! Built-in function catalog
//!
//! Every recognised function belongs to exactly one scanner category. The
//! category fixes the order in which the scanner tries recognizers at a
//! position; the arity decides whether a call is well formed.

use serde::{Deserialize, Serialize};

/// Scanner categories in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FunctionCategory {
    Aggregate,
    ProgramFlow,
    Inspection,
    DateTime,
    Text,
    Math,
    Conversion,
}

/// Accepted argument counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    /// `None` for variadic functions
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn range(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

macro_rules! builtins {
    ($( $variant:ident => $name:literal, $category:ident, $arity:expr; )*) => {
        /// Built-in functions recognised by the scanner
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum BuiltinFunction {
            $( $variant, )*
        }

        impl BuiltinFunction {
            pub const ALL: &'static [BuiltinFunction] = &[ $( BuiltinFunction::$variant, )* ];

            /// Canonical spelling
            pub const fn name(&self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )*
                }
            }

            pub const fn category(&self) -> FunctionCategory {
                match self {
                    $( Self::$variant => FunctionCategory::$category, )*
                }
            }

            pub const fn arity(&self) -> Arity {
                match self {
                    $( Self::$variant => $arity, )*
                }
            }
        }
    };
}

builtins! {
    // Aggregates: the optional trailing argument is a quoted dataset scope
    Count => "Count", Aggregate, Arity::range(1, 2);
    Sum => "Sum", Aggregate, Arity::range(1, 2);
    First => "First", Aggregate, Arity::range(1, 2);
    Last => "Last", Aggregate, Arity::range(1, 2);
    Avg => "Avg", Aggregate, Arity::range(1, 2);
    Min => "Min", Aggregate, Arity::range(1, 2);
    Max => "Max", Aggregate, Arity::range(1, 2);
    CountDistinct => "CountDistinct", Aggregate, Arity::range(1, 2);
    CountRows => "CountRows", Aggregate, Arity::range(0, 1);
    RowNumber => "RowNumber", Aggregate, Arity::range(0, 1);

    IIf => "IIf", ProgramFlow, Arity::exactly(3);
    Switch => "Switch", ProgramFlow, Arity::at_least(2);
    Choose => "Choose", ProgramFlow, Arity::at_least(2);

    IsNothing => "IsNothing", Inspection, Arity::exactly(1);
    IsNumeric => "IsNumeric", Inspection, Arity::exactly(1);
    IsDate => "IsDate", Inspection, Arity::exactly(1);

    Now => "Now", DateTime, Arity::exactly(0);
    Today => "Today", DateTime, Arity::exactly(0);
    Year => "Year", DateTime, Arity::exactly(1);
    Month => "Month", DateTime, Arity::exactly(1);
    Day => "Day", DateTime, Arity::exactly(1);
    Hour => "Hour", DateTime, Arity::exactly(1);
    Minute => "Minute", DateTime, Arity::exactly(1);
    Second => "Second", DateTime, Arity::exactly(1);
    DateAdd => "DateAdd", DateTime, Arity::exactly(3);
    DateDiff => "DateDiff", DateTime, Arity::exactly(3);
    DatePart => "DatePart", DateTime, Arity::exactly(2);
    DateSerial => "DateSerial", DateTime, Arity::exactly(3);
    MonthName => "MonthName", DateTime, Arity::range(1, 2);
    WeekdayName => "WeekdayName", DateTime, Arity::range(1, 2);
    Weekday => "Weekday", DateTime, Arity::exactly(1);
    FormatDateTime => "FormatDateTime", DateTime, Arity::range(1, 2);

    Len => "Len", Text, Arity::exactly(1);
    Left => "Left", Text, Arity::exactly(2);
    Right => "Right", Text, Arity::exactly(2);
    Mid => "Mid", Text, Arity::range(2, 3);
    UCase => "UCase", Text, Arity::exactly(1);
    LCase => "LCase", Text, Arity::exactly(1);
    Trim => "Trim", Text, Arity::exactly(1);
    LTrim => "LTrim", Text, Arity::exactly(1);
    RTrim => "RTrim", Text, Arity::exactly(1);
    Replace => "Replace", Text, Arity::exactly(3);
    InStr => "InStr", Text, Arity::range(2, 3);
    StrReverse => "StrReverse", Text, Arity::exactly(1);
    Format => "Format", Text, Arity::exactly(2);
    Space => "Space", Text, Arity::exactly(1);

    Abs => "Abs", Math, Arity::exactly(1);
    Round => "Round", Math, Arity::range(1, 2);
    Floor => "Floor", Math, Arity::exactly(1);
    Ceiling => "Ceiling", Math, Arity::exactly(1);
    Sqrt => "Sqrt", Math, Arity::exactly(1);
    Pow => "Pow", Math, Arity::exactly(2);
    Int => "Int", Math, Arity::exactly(1);
    Fix => "Fix", Math, Arity::exactly(1);
    Sign => "Sign", Math, Arity::exactly(1);

    CInt => "CInt", Conversion, Arity::exactly(1);
    CLng => "CLng", Conversion, Arity::exactly(1);
    CDbl => "CDbl", Conversion, Arity::exactly(1);
    CDec => "CDec", Conversion, Arity::exactly(1);
    CBool => "CBool", Conversion, Arity::exactly(1);
    CDate => "CDate", Conversion, Arity::exactly(1);
    CChar => "CChar", Conversion, Arity::exactly(1);
    CStr => "CStr", Conversion, Arity::exactly(1);
}

impl BuiltinFunction {
    /// Case-insensitive lookup by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.name().eq_ignore_ascii_case(name))
    }

    pub fn is_aggregate(&self) -> bool {
        self.category() == FunctionCategory::Aggregate
    }

    /// Whether `count` arguments form a well-formed call
    pub fn accepts_arguments(&self, count: usize) -> bool {
        match self {
            // condition/value pairs
            Self::Switch => count >= 2 && count % 2 == 0,
            other => other.arity().accepts(count),
        }
    }

    /// Functions that may be written without parentheses (`=Today`)
    pub fn allows_bare_call(&self) -> bool {
        matches!(self, Self::Now | Self::Today)
    }
}

/// Built-in global collections (`Globals!X`, `User!X`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalVariable {
    ExecutionTime,
    ReportName,
    PageNumber,
    TotalPages,
    Language,
    UserId,
}

impl GlobalVariable {
    pub const ALL: &'static [GlobalVariable] = &[
        Self::ExecutionTime,
        Self::ReportName,
        Self::PageNumber,
        Self::TotalPages,
        Self::Language,
        Self::UserId,
    ];

    /// Collection and member name as written (`Globals`, `ExecutionTime`)
    pub const fn path(&self) -> (&'static str, &'static str) {
        match self {
            Self::ExecutionTime => ("Globals", "ExecutionTime"),
            Self::ReportName => ("Globals", "ReportName"),
            Self::PageNumber => ("Globals", "PageNumber"),
            Self::TotalPages => ("Globals", "TotalPages"),
            Self::Language => ("User", "Language"),
            Self::UserId => ("User", "UserID"),
        }
    }

    /// Resolve `collection!member`, case-insensitively
    pub fn from_path(collection: &str, member: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|g| {
            let (c, m) = g.path();
            c.eq_ignore_ascii_case(collection) && m.eq_ignore_ascii_case(member)
        })
    }
}
