//! Human readable sizes and durations as shown in reports.

const BYTE_UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SECOND: u64 = 1_000_000_000;
const NANOS_PER_MINUTE: u64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MINUTE;

/// Converts `bytes` into the largest fitting binary unit, rounded to two
/// decimals. Trailing zeros are dropped: `1536` becomes `1.5 KB`.
pub fn bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{} {}", round(value), BYTE_UNITS[unit])
}

fn round(value: f64) -> String {
    let fixed = format!("{value:.2}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_owned()
}

/// Smallest unit shown by [nanoseconds].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precision {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
}

impl Precision {
    fn symbol(self) -> &'static str {
        match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "µs",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
        }
    }
}

/// Splits `nanos` into hours, minutes, seconds and so on down to `precision`.
///
/// Units with a value of zero are left out. If nothing remains the result is
/// zero in the unit of `precision`, e.g. `0ms`.
pub fn nanoseconds(nanos: u64, precision: Precision) -> String {
    let parts = [
        (Precision::Hours, nanos / NANOS_PER_HOUR),
        (Precision::Minutes, nanos % NANOS_PER_HOUR / NANOS_PER_MINUTE),
        (Precision::Seconds, nanos % NANOS_PER_MINUTE / NANOS_PER_SECOND),
        (Precision::Milliseconds, nanos % NANOS_PER_SECOND / NANOS_PER_MILLI),
        (Precision::Microseconds, nanos % NANOS_PER_MILLI / NANOS_PER_MICRO),
        (Precision::Nanoseconds, nanos % NANOS_PER_MICRO),
    ];

    let time: Vec<_> = parts
        .into_iter()
        .filter(|&(unit, value)| unit >= precision && value > 0)
        .map(|(unit, value)| format!("{value}{}", unit.symbol()))
        .collect();

    if time.is_empty() {
        format!("0{}", precision.symbol())
    } else {
        time.join(" ")
    }
}

/// [nanoseconds] with millisecond precision.
pub fn duration(nanos: u64) -> String {
    nanoseconds(nanos, Precision::Milliseconds)
}
