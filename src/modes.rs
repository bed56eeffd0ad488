//! Viewer launch targets for a study row.

use url::form_urlencoded;

use crate::model::Study;
use crate::utils::modalities_for_mode_check;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModeValidity {
    pub valid: bool,
    /// Why the mode cannot open this study, when it cannot.
    pub description: Option<String>,
}

impl ModeValidity {
    pub fn valid() -> Self {
        Self {
            valid: true,
            description: None,
        }
    }

    pub fn invalid(description: impl Into<String>) -> Self {
        Self {
            valid: false,
            description: Some(description.into()),
        }
    }
}

/// A viewer mode a study can be opened in.
pub trait Mode: Send + Sync {
    fn route_name(&self) -> &str;

    /// Modes without a display name are not offered.
    fn display_name(&self) -> Option<&str>;

    /// `modalities` is comma-joined, with `/` already replaced by `\`.
    fn is_valid(&self, modalities: &str, study: &Study) -> ModeValidity;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeLink {
    pub route_name: String,
    pub display_name: String,
    pub href: String,
    pub enabled: bool,
    pub disabled_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchOptions<'a> {
    pub data_path: &'a str,
    pub config_url: Option<&'a str>,
    pub group_enabled_first: bool,
}

pub fn launch_targets(modes: &[Box<dyn Mode>], study: &Study, options: LaunchOptions<'_>) -> Vec<ModeLink> {
    let modalities = modalities_for_mode_check(&study.modalities);
    let query = launch_query(&study.study_instance_uid, options.config_url);

    let mut links: Vec<ModeLink> = modes
        .iter()
        .filter_map(|mode| {
            let display_name = mode.display_name()?;
            let validity = mode.is_valid(&modalities, study);
            Some(ModeLink {
                route_name: mode.route_name().to_string(),
                display_name: display_name.to_string(),
                href: format!("{}{}?{query}", mode.route_name(), options.data_path),
                enabled: validity.valid,
                disabled_reason: if validity.valid { None } else { validity.description },
            })
        })
        .collect();

    if options.group_enabled_first {
        links.sort_by_key(|link| !link.enabled);
    }
    links
}

fn launch_query(study_instance_uid: &str, config_url: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(config_url) = config_url.filter(|url| !url.is_empty()) {
        query.append_pair("configUrl", config_url);
    }
    query.append_pair("StudyInstanceUIDs", study_instance_uid);
    query.finish()
}

/// Accepts a study when it carries any of the listed modalities.
#[derive(Debug, Clone)]
pub struct ModalityMode {
    route_name: String,
    display_name: String,
    modalities: Vec<String>,
}

impl ModalityMode {
    pub fn new(route_name: impl Into<String>, display_name: impl Into<String>, modalities: &[&str]) -> Self {
        Self {
            route_name: route_name.into(),
            display_name: display_name.into(),
            modalities: modalities.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl Mode for ModalityMode {
    fn route_name(&self) -> &str {
        &self.route_name
    }

    fn display_name(&self) -> Option<&str> {
        Some(&self.display_name)
    }

    fn is_valid(&self, modalities: &str, _study: &Study) -> ModeValidity {
        if self.modalities.is_empty() {
            return ModeValidity::valid();
        }
        let offered = modalities.split([',', '\\']).any(|modality| {
            self.modalities
                .iter()
                .any(|wanted| wanted.eq_ignore_ascii_case(modality))
        });
        if offered {
            ModeValidity::valid()
        } else {
            ModeValidity::invalid(format!(
                "{} requires one of: {}",
                self.display_name,
                self.modalities.join(", ")
            ))
        }
    }
}
