////////////////////////////////////////////////////////////////////////////////
// This file is part of "Ad Astra", an embeddable scripting programming       //
// language platform.                                                         //
//                                                                            //
// This work is proprietary software with source-available code.              //
//                                                                            //
// To copy, use, distribute, or contribute to this work, you must agree to    //
// the terms of the General License Agreement:                                //
//                                                                            //
// https://github.com/Eliah-Lakhin/ad-astra/blob/master/EULA.md               //
//                                                                            //
// The agreement grants a Basic Commercial License, allowing you to use       //
// this work in non-commercial and limited commercial products with a total   //
// gross revenue cap. To remove this commercial limit for one of your         //
// products, you must acquire a Full Commercial License.                      //
//                                                                            //
// If you contribute to the source code, documentation, or related materials, //
// you must grant me an exclusive license to these contributions.             //
// Contributions are governed by the "Contributions" section of the General   //
// License Agreement.                                                         //
//                                                                            //
// Copying the work in parts is strictly forbidden, except as permitted       //
// under the General License Agreement.                                       //
//                                                                            //
// If you do not or cannot agree to the terms of this Agreement,              //
// do not use this work.                                                      //
//                                                                            //
// This work is provided "as is", without any warranties, express or implied, //
// except where such disclaimers are legally invalid.                         //
//                                                                            //
// Copyright (c) 2024 Ilya Lakhin (Илья Александрович Лахин).                 //
// All rights reserved.                                                       //
////////////////////////////////////////////////////////////////////////////////

use std::fmt::{Display, Formatter};

use crate::{exports::Primitive, reflect_value};

/// A calendar date and a time of day with millisecond precision.
///
/// The textual representation is `YYYY-MM-DD HH:MM:SS.mmm`.
///
/// ```
/// use ad_astra_reflect::{exports::DateTime, runtime::Value};
///
/// let boxed = Value::deserialize("DateTime", "2024-02-29 23:59:59.999").unwrap();
/// let date = *boxed.unbox::<DateTime>().unwrap();
///
/// assert_eq!(date, DateTime::new(2024, 2, 29, 23, 59, 59, 999).unwrap());
/// assert!(Value::deserialize("DateTime", "2023-02-29 00:00:00.000").is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    millisecond: u16,
}

reflect_value!(DateTime);

impl Default for DateTime {
    #[inline(always)]
    fn default() -> Self {
        Self {
            year: 1,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
            millisecond: 0,
        }
    }
}

impl Display for DateTime {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_fmt(format_args!(
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:03}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.millisecond,
        ))
    }
}

impl Primitive for DateTime {
    const NAME: &'static str = "DateTime";

    #[inline(always)]
    fn to_text(&self) -> String {
        self.to_string()
    }

    fn from_text(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();

        if bytes.len() != 23 {
            return None;
        }

        for (index, separator) in [(4, b'-'), (7, b'-'), (10, b' '), (13, b':'), (16, b':'), (19, b'.')] {
            if bytes[index] != separator {
                return None;
            }
        }

        let field = |from: usize, to: usize| -> Option<u16> {
            bytes[from..to].iter().try_fold(0u16, |value, byte| {
                if !byte.is_ascii_digit() {
                    return None;
                }

                Some(value * 10 + u16::from(byte - b'0'))
            })
        };

        Self::new(
            field(0, 4)?,
            cast::u8(field(5, 7)?).ok()?,
            cast::u8(field(8, 10)?).ok()?,
            cast::u8(field(11, 13)?).ok()?,
            cast::u8(field(14, 16)?).ok()?,
            cast::u8(field(17, 19)?).ok()?,
            field(20, 23)?,
        )
    }
}

impl DateTime {
    /// Creates a DateTime from its components.
    ///
    /// Returns None if any component is out of range, including the days
    /// that do not exist in the month.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        millisecond: u16,
    ) -> Option<Self> {
        if !(1..=9999).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }

        if day == 0 || day > days_in_month(year, month) {
            return None;
        }

        if hour > 23 || minute > 59 || second > 59 || millisecond > 999 {
            return None;
        }

        Some(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
            millisecond,
        })
    }

    #[inline(always)]
    pub fn year(&self) -> u16 {
        self.year
    }

    #[inline(always)]
    pub fn month(&self) -> u8 {
        self.month
    }

    #[inline(always)]
    pub fn day(&self) -> u8 {
        self.day
    }

    #[inline(always)]
    pub fn hour(&self) -> u8 {
        self.hour
    }

    #[inline(always)]
    pub fn minute(&self) -> u8 {
        self.minute
    }

    #[inline(always)]
    pub fn second(&self) -> u8 {
        self.second
    }

    #[inline(always)]
    pub fn millisecond(&self) -> u16 {
        self.millisecond
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

#[cfg(test)]
mod tests {
    use crate::{exports::DateTime, runtime::Value};

    #[test]
    fn test_date_format() {
        let date = DateTime::new(987, 6, 5, 4, 3, 2, 1).unwrap();
        let text = Value::give(date).unwrap().serialize().unwrap();

        assert_eq!(text, "0987-06-05 04:03:02.001");
        assert_eq!(
            *Value::deserialize("DateTime", &text).unwrap().unbox::<DateTime>().unwrap(),
            date,
        );

        for text in [
            "2024-13-01 00:00:00.000",
            "2024-01-01 24:00:00.000",
            "2024-01-01T00:00:00.000",
            "2024-01-01 00:00:00",
            "2024-1-01 00:00:00.0000",
            "1900-02-29 00:00:00.000",
            "+024-01-01 00:00:00.000",
        ] {
            assert!(Value::deserialize("DateTime", text).is_err(), "accepted {text:?}");
        }

        assert_eq!(
            Value::create("DateTime", &[]).unwrap().serialize().unwrap(),
            "0001-01-01 00:00:00.000",
        );
    }
}
