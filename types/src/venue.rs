//! Venues (popup stores) as seen by the verification engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{Coordinate, TypesError, VenueId};

/// Operational status of a venue, owned by the onboarding/campaign flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueStatus {
    /// Created but not yet published.
    Pending,
    /// Crowdfunding in progress; the store has not opened.
    Funding,
    /// Funding goal reached; the store is open.
    Confirmed,
    /// The popup has run its course. Check-ins are still honoured.
    Completed,
    /// Called off; never opens.
    Cancelled,
}

impl VenueStatus {
    /// Whether visitors may verify presence at a venue in this state.
    pub fn accepts_verification(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Completed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Funding => "funding",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for VenueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-venue HMAC key for the rotating display code.
///
/// Never printed; bytes are zeroized on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct VenueSecret(Vec<u8>);

impl VenueSecret {
    /// Minimum key length (128 bits).
    pub const MIN_LEN: usize = 16;

    pub fn new(bytes: Vec<u8>) -> Result<Self, TypesError> {
        if bytes.len() < Self::MIN_LEN {
            return Err(TypesError::WeakSecret {
                len: bytes.len(),
                min: Self::MIN_LEN,
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for VenueSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VenueSecret(<{} bytes>)", self.0.len())
    }
}

/// A venue record, validated when read from storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    /// Published location. Immutable once the venue is public.
    pub location: Coordinate,
    pub status: VenueStatus,
    pub secret: VenueSecret,
    /// Overrides the engine-wide GPS radius when set.
    #[serde(default)]
    pub max_range_meters: Option<f64>,
}

impl Venue {
    /// Check invariants that serde alone cannot express.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.secret.as_bytes().len() < VenueSecret::MIN_LEN {
            return Err(TypesError::WeakSecret {
                len: self.secret.as_bytes().len(),
                min: VenueSecret::MIN_LEN,
            });
        }
        if let Some(range) = self.max_range_meters {
            if !range.is_finite() || range <= 0.0 {
                return Err(TypesError::InvalidParams(format!(
                    "venue {} max_range_meters must be positive, got {range}",
                    self.id
                )));
            }
        }
        Ok(())
    }
}
