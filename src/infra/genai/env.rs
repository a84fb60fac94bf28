use std::time::Duration;

use crate::domain::StylizeError;

pub(crate) fn read_env_var(name: &str) -> Result<Option<String>, StylizeError> {
    match std::env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(error) => Err(StylizeError::validation(format!(
            "{name} could not be read: {error}"
        ))),
    }
}

pub(crate) fn parse_timeout_seconds(name: &str, value: &str) -> Result<Duration, StylizeError> {
    let parsed = value.trim().parse::<u64>().map_err(|_| {
        StylizeError::validation(format!("{name} must be a positive integer in seconds"))
    })?;
    if parsed == 0 {
        return Err(StylizeError::validation(format!(
            "{name} must be greater than 0 seconds"
        )));
    }
    Ok(Duration::from_secs(parsed))
}
