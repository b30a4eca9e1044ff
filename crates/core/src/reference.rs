//! # Appointment reference IDs
//!
//! A reference ID is five case-sensitive symbols from `[a-zA-Z0-9]`, unique across
//! all appointments. The column holding it is wider (10) so the length can grow
//! later without a schema change.
//!
//! Allocation draws a random candidate, optionally probes the store, then tries to
//! claim it. The probe only saves a round trip: two writers can both see a
//! candidate as free, so a claim rejected by the unique constraint simply starts
//! over with a new draw. Retries are bounded by [`ReferenceAllocator::max_attempts`].

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{CampusError, CampusResult};

/// Letters (both cases) and decimal digits, 62 symbols.
pub const REFERENCE_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of symbols in a newly issued reference ID.
pub const REFERENCE_ID_LENGTH: usize = 5;

/// Width of the `reference_id` column.
pub const REFERENCE_ID_MAX_LENGTH: usize = 10;

/// Attempts made before giving up with [`CampusError::AllocationExhausted`].
pub const DEFAULT_MAX_ATTEMPTS: u32 = 16;

/// A validated appointment reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceId(String);

impl ReferenceId {
    /// Accepts 1 to [`REFERENCE_ID_MAX_LENGTH`] alphanumeric ASCII symbols. Case is
    /// preserved.
    pub fn parse(raw: &str) -> CampusResult<Self> {
        if raw.is_empty() || raw.len() > REFERENCE_ID_MAX_LENGTH {
            return Err(CampusError::Validation(format!(
                "Reference ID must be 1 to {} characters long",
                REFERENCE_ID_MAX_LENGTH
            )));
        }
        if !raw.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(CampusError::Validation(
                "Reference ID may only contain letters and digits".to_string(),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReferenceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for ReferenceId {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReferenceId {
    type Error = CampusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ReferenceId> for String {
    fn from(value: ReferenceId) -> Self {
        value.0
    }
}

/// Draws candidate IDs uniformly from an alphabet.
#[derive(Debug, Clone)]
pub struct ReferenceGenerator {
    alphabet: Vec<u8>,
    length: usize,
}

impl Default for ReferenceGenerator {
    fn default() -> Self {
        Self {
            alphabet: REFERENCE_ALPHABET.to_vec(),
            length: REFERENCE_ID_LENGTH,
        }
    }
}

impl ReferenceGenerator {
    /// A generator over a custom alphabet, mostly useful to force collisions.
    pub fn new(alphabet: &[u8], length: usize) -> CampusResult<Self> {
        if alphabet.is_empty() || !alphabet.iter().all(u8::is_ascii_alphanumeric) {
            return Err(CampusError::Validation(
                "Reference alphabet must be non-empty ASCII letters and digits".to_string(),
            ));
        }
        if length == 0 || length > REFERENCE_ID_MAX_LENGTH {
            return Err(CampusError::Validation(format!(
                "Reference length must be between 1 and {}",
                REFERENCE_ID_MAX_LENGTH
            )));
        }
        Ok(Self {
            alphabet: alphabet.to_vec(),
            length,
        })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of distinct IDs this generator can produce.
    pub fn keyspace(&self) -> u128 {
        (self.alphabet.len() as u128).saturating_pow(self.length as u32)
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> ReferenceId {
        let id = (0..self.length)
            .map(|_| {
                *self
                    .alphabet
                    .choose(rng)
                    .unwrap_or(&REFERENCE_ALPHABET[0]) as char
            })
            .collect();
        ReferenceId(id)
    }
}

/// Result of trying to write a candidate reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim<T> {
    /// The write went through.
    Claimed(T),
    /// Another row already holds the candidate.
    Taken,
}

/// Outcome of an assignment to an existing appointment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    Assigned,
    /// The candidate was rejected by the unique constraint.
    Conflict,
    /// The appointment already carries a reference; it was left untouched.
    AlreadyAssigned(ReferenceId),
}

/// Storage the allocator probes and writes through.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Advisory probe; a `false` here does not guarantee the claim will succeed.
    async fn reference_exists(&self, reference: &ReferenceId) -> CampusResult<bool>;

    /// Writes `reference` into the appointment's `reference_id` column only if that
    /// column is still empty.
    async fn assign_reference(
        &self,
        appointment_id: Uuid,
        reference: &ReferenceId,
    ) -> CampusResult<Assignment>;
}

/// A successfully allocated value together with how many draws it took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation<T> {
    pub reference: ReferenceId,
    pub value: T,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct ReferenceAllocator {
    generator: ReferenceGenerator,
    max_attempts: u32,
}

impl Default for ReferenceAllocator {
    fn default() -> Self {
        Self {
            generator: ReferenceGenerator::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ReferenceAllocator {
    pub fn new(generator: ReferenceGenerator, max_attempts: u32) -> CampusResult<Self> {
        if max_attempts == 0 {
            return Err(CampusError::Validation(
                "Reference allocation needs at least one attempt".to_string(),
            ));
        }
        Ok(Self {
            generator,
            max_attempts,
        })
    }

    pub fn with_max_attempts(max_attempts: u32) -> CampusResult<Self> {
        Self::new(ReferenceGenerator::default(), max_attempts)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn generator(&self) -> &ReferenceGenerator {
        &self.generator
    }

    fn draw(&self) -> ReferenceId {
        self.generator.generate(&mut rand::thread_rng())
    }

    /// Draws candidates until `claim` accepts one.
    ///
    /// `claim` performs the write (an insert of a new row, typically) and reports
    /// [`Claim::Taken`] when the unique constraint rejected it. Any other error
    /// aborts allocation immediately.
    pub async fn allocate_with<S, T, F, Fut>(
        &self,
        store: &S,
        mut claim: F,
    ) -> CampusResult<Allocation<T>>
    where
        S: ReferenceStore + ?Sized,
        F: FnMut(ReferenceId) -> Fut,
        Fut: Future<Output = CampusResult<Claim<T>>>,
    {
        for attempt in 1..=self.max_attempts {
            let candidate = self.draw();

            if store.reference_exists(&candidate).await? {
                debug!(attempt, "Reference {} already in use, redrawing", candidate);
                continue;
            }

            match claim(candidate.clone()).await? {
                Claim::Claimed(value) => {
                    debug!(attempt, "Allocated reference {}", candidate);
                    return Ok(Allocation {
                        reference: candidate,
                        value,
                        attempts: attempt,
                    });
                }
                Claim::Taken => {
                    warn!(attempt, "Reference {} was claimed concurrently, retrying", candidate);
                }
            }
        }

        Err(CampusError::AllocationExhausted {
            attempts: self.max_attempts,
        })
    }

    /// Gives an existing appointment a reference if it does not have one yet.
    ///
    /// An appointment that already holds a reference keeps it; the existing value
    /// is returned with `attempts == 0`.
    pub async fn assign<S>(&self, store: &S, appointment_id: Uuid) -> CampusResult<Allocation<()>>
    where
        S: ReferenceStore + ?Sized,
    {
        let allocation = self
            .allocate_with(store, move |candidate| async move {
                match store.assign_reference(appointment_id, &candidate).await? {
                    Assignment::Assigned => Ok(Claim::Claimed(None)),
                    Assignment::Conflict => Ok(Claim::Taken),
                    Assignment::AlreadyAssigned(current) => Ok(Claim::Claimed(Some(current))),
                }
            })
            .await?;

        Ok(match allocation.value {
            Some(current) => Allocation {
                reference: current,
                value: (),
                attempts: 0,
            },
            None => Allocation {
                reference: allocation.reference,
                value: (),
                attempts: allocation.attempts,
            },
        })
    }
}

/// Whether `value` has the shape of a freshly issued reference ID.
pub fn is_issued_shape(value: &str) -> bool {
    value.len() == REFERENCE_ID_LENGTH && value.bytes().all(|b| REFERENCE_ALPHABET.contains(&b))
}
