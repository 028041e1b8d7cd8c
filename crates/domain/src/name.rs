use derive_more::{AsRef, Display, Into};

/// Label of a category or exercise as entered by the user, with surrounding
/// whitespace removed.
#[derive(AsRef, Debug, Display, Clone, Into, PartialEq, Eq, PartialOrd, Ord)]
pub struct Name(String);

impl Name {
    /// Counted in characters, so accented labels get the same room.
    pub const MAX_CHARS: usize = 64;

    pub fn new(name: impl AsRef<str>) -> Result<Self, NameError> {
        let label = name.as_ref().trim();
        let chars = label.chars().count();

        match chars {
            0 => Err(NameError::Empty),
            n if n > Self::MAX_CHARS => Err(NameError::TooLong(n)),
            _ => Ok(Name(label.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum NameError {
    #[error("name is empty")]
    Empty,
    #[error("name has {0} characters, at most {max} are allowed", max = Name::MAX_CHARS)]
    TooLong(usize),
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Peito", Ok("Peito"))]
    #[case("  Tríceps\t", Ok("Tríceps"))]
    #[case("Leg press 45°", Ok("Leg press 45°"))]
    #[case("", Err(NameError::Empty))]
    #[case(" \n ", Err(NameError::Empty))]
    fn test_name_new(#[case] input: &str, #[case] expected: Result<&str, NameError>) {
        assert_eq!(Name::new(input).as_ref().map(Name::as_str), expected.as_ref().copied());
    }

    #[rstest]
    #[case("é".repeat(64), None)]
    #[case("é".repeat(65), Some(65))]
    #[case("x".repeat(80), Some(80))]
    fn test_name_length(#[case] input: String, #[case] too_long: Option<usize>) {
        assert_eq!(
            Name::new(input).err(),
            too_long.map(NameError::TooLong)
        );
    }

    #[test]
    fn test_name_error_display() {
        assert_eq!(
            NameError::TooLong(70).to_string(),
            "name has 70 characters, at most 64 are allowed"
        );
    }
}
