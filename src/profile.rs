//! Firing profiles: validated temperature-vs-time curves.
//!
//! A [`Profile`] is immutable once constructed. Construction is the only
//! place the point sequence is checked, so every `Profile` in the system
//! is non-empty, strictly increasing in time and finite.

use core::fmt;

/// One breakpoint of a firing curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    /// Seconds from the start of the run.
    pub offset_secs: f32,
    pub target_c: f32,
}

impl ProfilePoint {
    pub const fn new(offset_secs: f32, target_c: f32) -> Self {
        Self {
            offset_secs,
            target_c,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileError {
    /// No points at all.
    Empty,
    /// `points[index]` does not come strictly after `points[index - 1]`.
    NotIncreasing { index: usize },
    /// `points[index]` has a NaN or infinite field.
    NonFinite { index: usize },
    /// Offsets must not be negative.
    NegativeOffset { index: usize },
    /// A profile file could not be read or parsed.
    Unreadable,
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "profile has no points"),
            Self::NotIncreasing { index } => {
                write!(f, "point {index} is not later than the point before it")
            }
            Self::NonFinite { index } => write!(f, "point {index} is not a finite number"),
            Self::NegativeOffset { index } => write!(f, "point {index} has a negative offset"),
            Self::Unreadable => write!(f, "profile file unreadable"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    name: String,
    points: Vec<ProfilePoint>,
}

impl Profile {
    pub fn new(name: impl Into<String>, points: Vec<ProfilePoint>) -> Result<Self, ProfileError> {
        if points.is_empty() {
            return Err(ProfileError::Empty);
        }
        for (index, p) in points.iter().enumerate() {
            if !(p.offset_secs.is_finite() && p.target_c.is_finite()) {
                return Err(ProfileError::NonFinite { index });
            }
            if p.offset_secs < 0.0 {
                return Err(ProfileError::NegativeOffset { index });
            }
            if index > 0 && p.offset_secs <= points[index - 1].offset_secs {
                return Err(ProfileError::NotIncreasing { index });
            }
        }
        Ok(Self {
            name: name.into(),
            points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    /// Offset of the last point.
    pub fn duration_secs(&self) -> f32 {
        self.last().offset_secs
    }

    pub fn final_target(&self) -> f32 {
        self.last().target_c
    }

    /// Target temperature at `t` seconds.
    ///
    /// Linear between the bracketing points; held at the first or last
    /// point's value outside the profile's span.
    pub fn target_at(&self, t: f32) -> f32 {
        let first = self.points[0];
        if t <= first.offset_secs {
            return first.target_c;
        }
        for pair in self.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.offset_secs {
                let frac = (t - a.offset_secs) / (b.offset_secs - a.offset_secs);
                return a.target_c + frac * (b.target_c - a.target_c);
            }
        }
        self.final_target()
    }

    fn last(&self) -> ProfilePoint {
        // Non-empty by construction.
        self.points[self.points.len() - 1]
    }
}
