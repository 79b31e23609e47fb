use serde::{Deserialize, Serialize};

/// Letter grade shown next to a shop's rating.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustGrade {
    A,
    B,
    C,
    D,
    F,
}

impl TrustGrade {
    pub fn from_rating(avg: f64) -> TrustGrade {
        if avg >= 4.5 {
            TrustGrade::A
        } else if avg >= 3.5 {
            TrustGrade::B
        } else if avg >= 2.5 {
            TrustGrade::C
        } else if avg >= 1.5 {
            TrustGrade::D
        } else {
            TrustGrade::F
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrustGrade::A => "A",
            TrustGrade::B => "B",
            TrustGrade::C => "C",
            TrustGrade::D => "D",
            TrustGrade::F => "F",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrustGrade::A => "Excellent",
            TrustGrade::B => "Good",
            TrustGrade::C => "Satisfactory",
            TrustGrade::D => "Adequate",
            TrustGrade::F => "Poor",
        }
    }
}

/// Average rounded to two decimals, or 0.0 without ratings.
pub fn average_rating(ratings: &[u8]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(*r)).sum();
    let avg = f64::from(sum) / ratings.len() as f64;
    (avg * 100.0).round() / 100.0
}
