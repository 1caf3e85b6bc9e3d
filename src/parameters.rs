use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use clap::ValueEnum;

use crate::error::ParameterError;

pub const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
pub const MAX_TOKENS_RANGE: RangeInclusive<u32> = 50..=300;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 150;

/// Chat models the client can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ModelId {
    #[default]
    #[value(name = "gpt-3.5-turbo")]
    Gpt35Turbo,
    #[value(name = "gpt-4o-mini")]
    Gpt4oMini,
    #[value(name = "gpt-4o")]
    Gpt4o,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [ModelId::Gpt35Turbo, ModelId::Gpt4oMini, ModelId::Gpt4o];

    /// Identifier as the provider expects it on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelId::Gpt35Turbo => "gpt-3.5-turbo",
            ModelId::Gpt4oMini => "gpt-4o-mini",
            ModelId::Gpt4o => "gpt-4o",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ModelId::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| ParameterError::UnknownModel(s.to_string()))
    }
}

/// An API key. Never printed: both `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input so an empty key counts as absent.
    pub fn new(secret: impl Into<String>) -> Option<Self> {
        let secret = secret.into().trim().to_string();
        if secret.is_empty() {
            None
        } else {
            Some(Self(secret))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(****)")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Sampling settings and credential used for each completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestParameters {
    model: ModelId,
    temperature: f32,
    max_tokens: u32,
    credential: Option<Credential>,
}

impl Default for RequestParameters {
    fn default() -> Self {
        Self {
            model: ModelId::default(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            credential: None,
        }
    }
}

impl RequestParameters {
    pub fn new(
        model: ModelId,
        temperature: f32,
        max_tokens: u32,
        credential: Option<Credential>,
    ) -> Result<Self, ParameterError> {
        let mut params = Self {
            model,
            credential,
            ..Self::default()
        };
        params.set_temperature(temperature)?;
        params.set_max_tokens(max_tokens)?;
        Ok(params)
    }

    pub fn model(&self) -> ModelId {
        self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn set_model(&mut self, model: ModelId) {
        self.model = model;
    }

    /// Rejects values outside [0.0, 1.0] and keeps the previous one.
    pub fn set_temperature(&mut self, temperature: f32) -> Result<(), ParameterError> {
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(ParameterError::Temperature(temperature));
        }
        self.temperature = temperature;
        Ok(())
    }

    /// Rejects values outside [50, 300] and keeps the previous one.
    pub fn set_max_tokens(&mut self, max_tokens: u32) -> Result<(), ParameterError> {
        if !MAX_TOKENS_RANGE.contains(&max_tokens) {
            return Err(ParameterError::MaxTokens(max_tokens));
        }
        self.max_tokens = max_tokens;
        Ok(())
    }

    pub fn set_credential(&mut self, credential: Option<Credential>) {
        self.credential = credential;
    }
}
