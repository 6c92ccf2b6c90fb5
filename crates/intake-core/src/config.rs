//! Configuration loaded from a TOML file.
//!
//! Every section has serde defaults so a partial (or absent) file still
//! yields a runnable configuration. The message catalog and the department
//! table are data, not code: offices override them without recompiling.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::types::{Department, DepartmentDirectory};

/// Root configuration for the intake service.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IntakeConfig {
    pub general: GeneralConfig,
    pub session: SessionConfig,
    pub reply: ReplyConfig,
    pub hours: HoursConfig,
    pub webhook: WebhookConfig,
    pub notify: NotifyConfig,
    pub departments: DepartmentsConfig,
    pub messages: MessageCatalog,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Office name interpolated into the opening message.
    pub office_name: String,
    pub data_dir: String,
    pub log_level: String,
    /// Port for the status/health HTTP surface.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            office_name: "Advocacia & Associados".to_string(),
            data_dir: "~/.intake".to_string(),
            log_level: "info".to_string(),
            port: 8471,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Idle minutes before a session is dropped.
    pub idle_timeout_minutes: u64,
    /// Idle minutes before the contact gets a still-there warning.
    pub warn_after_minutes: u64,
    pub sweep_interval_secs: u64,
    /// Minimum accepted length for a name reply.
    pub min_name_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: 30,
            warn_after_minutes: 15,
            sweep_interval_secs: 60,
            min_name_len: 3,
        }
    }
}

/// Typing-simulation bounds for outbound replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub per_char_ms: u64,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 600,
            max_delay_ms: 2500,
            per_char_ms: 30,
        }
    }
}

/// Business hours, used only to append an out-of-hours notice to the
/// closing message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HoursConfig {
    pub enabled: bool,
    /// Opening hour, 0-23 local time.
    pub start_hour: u32,
    /// Closing hour, exclusive.
    pub end_hour: u32,
}

impl Default for HoursConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_hour: 9,
            end_hour: 18,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Channel identifier of the staff inbox that receives lead alerts
    /// when a department has no recipient of its own.
    pub recipient_id: String,
    /// Self-service scheduling link offered at the end of the flow.
    pub scheduling_link: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            recipient_id: "5511999990000@c.us".to_string(),
            scheduling_link: "https://calendly.com/escritorio/atendimento".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartmentsConfig {
    /// Key of the catch-all department used for returning-contact
    /// continuations.
    pub general_key: u32,
    pub entries: Vec<Department>,
}

impl Default for DepartmentsConfig {
    fn default() -> Self {
        Self {
            general_key: 3,
            entries: vec![
                Department {
                    key: 1,
                    label: "Direito Trabalhista".to_string(),
                    recipient_id: "5511999990001@c.us".to_string(),
                },
                Department {
                    key: 2,
                    label: "Direito Previdenciário".to_string(),
                    recipient_id: "5511999990002@c.us".to_string(),
                },
                Department {
                    key: 3,
                    label: "Atendimento Geral".to_string(),
                    recipient_id: "5511999990003@c.us".to_string(),
                },
            ],
        }
    }
}

impl DepartmentsConfig {
    /// Validates the table into a directory usable by the flow.
    pub fn directory(&self) -> Result<DepartmentDirectory> {
        DepartmentDirectory::new(self.entries.clone(), self.general_key)
    }
}

/// Every text the service sends, in the office's own words.
///
/// Placeholders: `{office}`, `{name}`, `{menu}`, `{department}`, `{link}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageCatalog {
    pub opening: String,
    pub name_too_short: String,
    pub menu: String,
    pub invalid_department: String,
    pub ask_reason: String,
    pub ask_scheduling: String,
    pub closing_scheduled: String,
    pub closing_transfer: String,
    pub after_hours_suffix: String,
    pub reset_done: String,
    pub returning_menu: String,
    pub returning_invalid: String,
    pub returning_reason: String,
    pub idle_warning: String,
    pub idle_closed: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            opening: "Olá! 👋 Você está falando com o atendimento do escritório *{office}*.\n\nPara começar, por favor informe seu *nome e sobrenome*."
                .to_string(),
            name_too_short: "Não consegui identificar seu nome. Por favor, envie *nome e sobrenome*."
                .to_string(),
            menu: "Certo, *{name}*! Selecione a área desejada respondendo com o número:\n\n{menu}"
                .to_string(),
            invalid_department: "Opção inválida. 🙁 Responda apenas com o número de uma das áreas do menu."
                .to_string(),
            ask_reason: "Entendido! Agora descreva em poucas palavras o motivo do seu contato:"
                .to_string(),
            ask_scheduling: "Obrigado! Deseja *agendar um horário* de atendimento? Responda *sim* ou *não*."
                .to_string(),
            closing_scheduled: "Perfeito, *{name}*! 📅 Agende seu horário pelo link:\n{link}\n\nA equipe de *{department}* entrará em contato em breve."
                .to_string(),
            closing_transfer: "Perfeito, *{name}*! Estamos encaminhando seu atendimento para *{department}*. Aguarde, por favor."
                .to_string(),
            after_hours_suffix: "\n\n🕒 No momento estamos fora do horário comercial ({start}h às {end}h). Retornaremos no próximo dia útil."
                .to_string(),
            reset_done: "🔄 Atendimento reiniciado. Envie *oi* quando quiser recomeçar."
                .to_string(),
            returning_menu: "Que bom te ver de novo, *{name}*! 😊 Como podemos ajudar?\n\n*1* - Continuar atendimento anterior\n*2* - Iniciar novo atendimento"
                .to_string(),
            returning_invalid: "Por favor, responda *1* para continuar o atendimento anterior ou *2* para um novo atendimento."
                .to_string(),
            returning_reason: "Continuidade de atendimento anterior".to_string(),
            idle_warning: "Você ainda está aí? Este atendimento será encerrado em breve por inatividade."
                .to_string(),
            idle_closed: "Atendimento encerrado por inatividade. Envie *oi* para começar de novo."
                .to_string(),
        }
    }
}

impl IntakeConfig {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: IntakeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults if the file does not
    /// exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            tracing::info!(path = %path.display(), "Loading configuration");
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Writes the configuration to a TOML file, creating parent directories
    /// as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IntakeConfig::default();
        assert_eq!(config.session.idle_timeout_minutes, 30);
        assert_eq!(config.session.warn_after_minutes, 15);
        assert_eq!(config.session.sweep_interval_secs, 60);
        assert_eq!(config.hours.start_hour, 9);
        assert_eq!(config.hours.end_hour, 18);
        assert_eq!(config.departments.entries.len(), 3);
        assert!(!config.webhook.enabled);
    }

    #[test]
    fn test_default_department_table_validates() {
        let config = IntakeConfig::default();
        let dir = config.departments.directory().unwrap();
        assert_eq!(dir.general().label, "Atendimento Geral");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: IntakeConfig = toml::from_str(
            r#"
            [general]
            office_name = "Silva & Prado"
            port = 9000

            [webhook]
            enabled = true
            url = "https://example.com/leads"
            "#,
        )
        .unwrap();
        assert_eq!(config.general.office_name, "Silva & Prado");
        assert_eq!(config.general.port, 9000);
        assert!(config.webhook.enabled);
        // Untouched sections keep their defaults.
        assert_eq!(config.session.idle_timeout_minutes, 30);
        assert_eq!(config.reply.max_delay_ms, 2500);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = IntakeConfig::default();
        config.general.office_name = "Teste".to_string();
        config.session.idle_timeout_minutes = 5;
        config.save(&path).unwrap();

        let loaded = IntakeConfig::load(&path).unwrap();
        assert_eq!(loaded.general.office_name, "Teste");
        assert_eq!(loaded.session.idle_timeout_minutes, 5);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nonexistent.toml");
        let config = IntakeConfig::load_or_default(&path).unwrap();
        assert_eq!(config.general.port, 8471);
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general\noffice_name = ").unwrap();
        assert!(IntakeConfig::load(&path).is_err());
    }
}
