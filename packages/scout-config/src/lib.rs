mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, History, Jobs, LlmProviderConfig, Postgres, Providers, SearchApiProviderConfig,
	Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	let backend = cfg.storage.backend.as_str();

	if !matches!(backend, "memory" | "postgres") {
		return Err(Error::Validation {
			message: "storage.backend must be one of memory or postgres.".to_string(),
		});
	}
	if backend == "postgres" && cfg.storage.postgres.is_none() {
		return Err(Error::Validation {
			message: "storage.postgres is required when storage.backend is postgres.".to_string(),
		});
	}

	if let Some(postgres) = cfg.storage.postgres.as_ref() {
		if postgres.dsn.trim().is_empty() {
			return Err(Error::Validation {
				message: "storage.postgres.dsn must be non-empty.".to_string(),
			});
		}
		if postgres.pool_max_conns == 0 {
			return Err(Error::Validation {
				message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
			});
		}
	}

	let dispatch = cfg.jobs.dispatch.as_str();

	if !matches!(dispatch, "spawn" | "outbox") {
		return Err(Error::Validation {
			message: "jobs.dispatch must be one of spawn or outbox.".to_string(),
		});
	}
	if dispatch == "outbox" && backend != "postgres" {
		return Err(Error::Validation {
			message: "jobs.dispatch = outbox requires storage.backend = postgres.".to_string(),
		});
	}

	for (label, value) in [
		("jobs.provider_timeout_ms", cfg.jobs.provider_timeout_ms),
		("jobs.job_timeout_ms", cfg.jobs.job_timeout_ms),
		("jobs.estimated_completion_secs", cfg.jobs.estimated_completion_secs),
		("jobs.poll_interval_ms", cfg.jobs.poll_interval_ms),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if cfg.jobs.provider_timeout_ms > cfg.jobs.job_timeout_ms {
		return Err(Error::Validation {
			message: "jobs.provider_timeout_ms must not exceed jobs.job_timeout_ms.".to_string(),
		});
	}
	if cfg.jobs.claim_lease_seconds <= 0 {
		return Err(Error::Validation {
			message: "jobs.claim_lease_seconds must be greater than zero.".to_string(),
		});
	}
	if (cfg.jobs.claim_lease_seconds as u64).saturating_mul(1_000) < cfg.jobs.job_timeout_ms {
		return Err(Error::Validation {
			message: "jobs.claim_lease_seconds must cover jobs.job_timeout_ms.".to_string(),
		});
	}

	for (label, value) in [
		("history.max_entries", cfg.history.max_entries),
		("history.max_events", cfg.history.max_events),
		("history.max_raw_chars", cfg.history.max_raw_chars),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if let Some(primary) = cfg.providers.primary_search.as_ref() {
		if primary.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: "Provider primary_search api_key must be non-empty.".to_string(),
			});
		}
		if primary.engine.trim().is_empty() {
			return Err(Error::Validation {
				message: "providers.primary_search.engine must be non-empty.".to_string(),
			});
		}
	}

	for (label, provider) in [
		("secondary_search", cfg.providers.secondary_search.as_ref()),
		("formatter", cfg.providers.formatter.as_ref()),
	] {
		let Some(provider) = provider else {
			continue;
		};

		if provider.api_key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
		if !provider.temperature.is_finite() || provider.temperature < 0.0 {
			return Err(Error::Validation {
				message: format!("providers.{label}.temperature must be a finite number >= 0."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.storage.backend = cfg.storage.backend.trim().to_ascii_lowercase();
	cfg.jobs.dispatch = cfg.jobs.dispatch.trim().to_ascii_lowercase();
}
