//! Six-step registration dialogue
//!
//! [`Registration`] is the per-user state: one variant per awaited answer,
//! each carrying the draft collected so far. [`RegistrationSessions`] owns
//! every in-progress registration and persists the draft when the last
//! answer (a photo) arrives.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config;
use crate::error::AppResult;
use crate::storage::profiles::{self, NewProfile, UserProfile};
use crate::storage::{with_connection, DbPool};

/// One size variant of an uploaded photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: u32,
    pub height: u32,
}

impl PhotoSize {
    fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// What the user sent while a registration is open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationInput {
    Text(String),
    Photo(Vec<PhotoSize>),
}

/// Question the bot asks next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    Name,
    Race,
    Age,
    HeightWeight,
    Gender,
    Photo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    AwaitingName(NewProfile),
    AwaitingRace(NewProfile),
    AwaitingAge(NewProfile),
    AwaitingHeightWeight(NewProfile),
    AwaitingGender(NewProfile),
    AwaitingPhoto(NewProfile),
}

/// Result of feeding one input to a [`Registration`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Input accepted; ask the next question
    Next(Registration),
    /// Photo accepted; the draft is ready to persist
    Complete(NewProfile),
    /// Input does not fit the current step; state unchanged
    Ignored(Registration),
}

impl Registration {
    /// Fresh registration with the profile defaults, awaiting the name
    pub fn start(telegram_id: i64, username: &str) -> Self {
        Registration::AwaitingName(NewProfile::new(telegram_id, username))
    }

    pub fn prompt(&self) -> Prompt {
        match self {
            Registration::AwaitingName(_) => Prompt::Name,
            Registration::AwaitingRace(_) => Prompt::Race,
            Registration::AwaitingAge(_) => Prompt::Age,
            Registration::AwaitingHeightWeight(_) => Prompt::HeightWeight,
            Registration::AwaitingGender(_) => Prompt::Gender,
            Registration::AwaitingPhoto(_) => Prompt::Photo,
        }
    }

    pub fn draft(&self) -> &NewProfile {
        match self {
            Registration::AwaitingName(draft)
            | Registration::AwaitingRace(draft)
            | Registration::AwaitingAge(draft)
            | Registration::AwaitingHeightWeight(draft)
            | Registration::AwaitingGender(draft)
            | Registration::AwaitingPhoto(draft) => draft,
        }
    }

    /// Consumes one answer.
    ///
    /// Text steps take the trimmed text; whitespace-only text and photos are
    /// ignored there. The photo step takes the largest variant and ignores text.
    /// When the registering handle equals `superuser` (case-insensitively) the
    /// name step also grants administrator rights.
    pub fn advance(self, input: RegistrationInput, superuser: &str) -> Step {
        let text = match &input {
            RegistrationInput::Text(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            _ => None,
        };

        match (self, text) {
            (Registration::AwaitingName(mut draft), Some(name)) => {
                draft.name = name;
                if is_superuser(&draft.username, superuser) {
                    draft.name = profiles::with_admin_mark(&draft.name);
                    draft.is_admin = true;
                }
                Step::Next(Registration::AwaitingRace(draft))
            }
            (Registration::AwaitingRace(mut draft), Some(race)) => {
                draft.race = race;
                Step::Next(Registration::AwaitingAge(draft))
            }
            (Registration::AwaitingAge(mut draft), Some(age)) => {
                draft.age = age;
                Step::Next(Registration::AwaitingHeightWeight(draft))
            }
            (Registration::AwaitingHeightWeight(mut draft), Some(height_weight)) => {
                draft.height_weight = height_weight;
                Step::Next(Registration::AwaitingGender(draft))
            }
            (Registration::AwaitingGender(mut draft), Some(gender)) => {
                draft.gender = gender;
                Step::Next(Registration::AwaitingPhoto(draft))
            }
            (Registration::AwaitingPhoto(mut draft), _) => match input {
                RegistrationInput::Photo(sizes) => match largest_photo(&sizes) {
                    Some(photo) => {
                        draft.photo_file_id = photo.file_id.clone();
                        Step::Complete(draft)
                    }
                    None => Step::Ignored(Registration::AwaitingPhoto(draft)),
                },
                RegistrationInput::Text(_) => Step::Ignored(Registration::AwaitingPhoto(draft)),
            },
            (state, None) => Step::Ignored(state),
        }
    }
}

fn is_superuser(username: &str, superuser: &str) -> bool {
    !username.is_empty() && username.to_lowercase() == superuser.trim_start_matches('@').to_lowercase()
}

/// Largest variant by pixel area; the last one wins a tie
pub fn largest_photo(sizes: &[PhotoSize]) -> Option<&PhotoSize> {
    sizes.iter().max_by_key(|size| size.area())
}

/// What happened to an input routed through [`RegistrationSessions::advance`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The user has no registration in progress
    NoSession,
    /// The input did not fit the awaited step
    Ignored,
    /// Ask this next
    Prompt(Prompt),
    /// Profile stored; the session is gone
    Completed(UserProfile),
}

/// Table of in-progress registrations keyed by Telegram user id
#[derive(Clone)]
pub struct RegistrationSessions {
    sessions: Arc<Mutex<HashMap<i64, Registration>>>,
    superuser: Arc<str>,
}

impl RegistrationSessions {
    pub fn new(superuser: &str) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            superuser: Arc::from(superuser.trim_start_matches('@')),
        }
    }

    /// Opens (or restarts) the user's registration and returns the first prompt
    pub async fn start(&self, telegram_id: i64, username: &str) -> Prompt {
        let registration = Registration::start(telegram_id, username);
        let prompt = registration.prompt();
        let previous = self.sessions.lock().await.insert(telegram_id, registration);
        if previous.is_some() {
            log::info!("Registration restarted for user {}", telegram_id);
        } else {
            log::info!("Registration started for user {}", telegram_id);
        }
        prompt
    }

    /// Feeds one input to the user's registration.
    ///
    /// A failed save leaves the user at the photo step so the photo can be
    /// sent again.
    pub async fn advance(&self, pool: &DbPool, telegram_id: i64, input: RegistrationInput) -> AppResult<Advance> {
        let draft = {
            let mut sessions = self.sessions.lock().await;
            let Some(registration) = sessions.remove(&telegram_id) else {
                return Ok(Advance::NoSession);
            };

            match registration.advance(input, &self.superuser) {
                Step::Next(next) => {
                    let prompt = next.prompt();
                    sessions.insert(telegram_id, next);
                    return Ok(Advance::Prompt(prompt));
                }
                Step::Ignored(same) => {
                    sessions.insert(telegram_id, same);
                    return Ok(Advance::Ignored);
                }
                Step::Complete(draft) => draft,
            }
        };

        let to_store = draft.clone();
        let stored = with_connection(pool, config::store::query_timeout(), move |conn| {
            let tx = conn.transaction()?;
            let profile = profiles::upsert_profile(&tx, &to_store)?;
            tx.commit()?;
            Ok(profile)
        })
        .await;

        match stored {
            Ok(profile) => {
                log::info!("Registration completed for user {} (profile #{})", telegram_id, profile.id);
                Ok(Advance::Completed(profile))
            }
            Err(e) => {
                log::error!("Failed to save registration of user {}: {}", telegram_id, e);
                // A restart issued meanwhile takes precedence.
                if let Entry::Vacant(slot) = self.sessions.lock().await.entry(telegram_id) {
                    slot.insert(Registration::AwaitingPhoto(draft));
                }
                Err(e)
            }
        }
    }

    /// Drops the user's own registration; returns whether one existed
    pub async fn cancel(&self, telegram_id: i64) -> bool {
        let removed = self.sessions.lock().await.remove(&telegram_id).is_some();
        if removed {
            log::info!("Registration cancelled for user {}", telegram_id);
        }
        removed
    }

    /// Drops every registration; returns how many were open
    pub async fn reset_all(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let count = sessions.len();
        sessions.clear();
        log::warn!("All registration sessions reset ({} dropped)", count);
        count
    }

    pub async fn current(&self, telegram_id: i64) -> Option<Registration> {
        self.sessions.lock().await.get(&telegram_id).cloned()
    }

    pub async fn is_active(&self, telegram_id: i64) -> bool {
        self.sessions.lock().await.contains_key(&telegram_id)
    }
}
