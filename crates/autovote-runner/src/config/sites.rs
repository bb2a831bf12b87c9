use super::{LabelOverrides, Labels, RunConfig};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

fn default_iterations() -> u32 {
    1
}

/// A named target: where to log in, where the votes are, how many rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub name: String,
    pub login_url: String,
    pub vote_url: String,

    #[serde(default = "default_iterations")]
    pub default_iterations: u32,

    /// Extra caption patterns for this site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<LabelOverrides>,
}

impl Site {
    /// Build the run input for one identifier against this site.
    ///
    /// `iterations` of `None` or `Some(0)` falls back to the site default.
    pub fn run_config(
        &self,
        identifier: &str,
        choice_index: usize,
        iterations: Option<u32>,
    ) -> Result<RunConfig> {
        let labels = match self.labels {
            Some(ref overrides) => Labels::with_overrides(overrides)?,
            None => Labels::default(),
        };
        let max_iterations = iterations
            .filter(|n| *n > 0)
            .unwrap_or(self.default_iterations);
        Ok(RunConfig::new(identifier, &self.login_url, &self.vote_url)?
            .choice_index(choice_index)
            .max_iterations(max_iterations)
            .labels(labels))
    }

    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Config("site id is required".into()));
        }
        validate_fields(
            &self.name,
            &self.login_url,
            &self.vote_url,
            self.default_iterations,
        )?;
        if let Some(ref labels) = self.labels {
            Labels::with_overrides(labels)?;
        }
        Ok(())
    }
}

/// Fields for a site about to be created. Accepts the camelCase keys the
/// web dashboard sends as well.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSite {
    pub name: String,
    #[serde(alias = "loginUrl")]
    pub login_url: String,
    #[serde(alias = "voteUrl")]
    pub vote_url: String,
    #[serde(default, alias = "defaultIterations")]
    pub default_iterations: Option<u32>,
    #[serde(default)]
    pub labels: Option<LabelOverrides>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SiteFile {
    /// Id handed to the next created site. Ids are never reused.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_id: Option<u64>,
    #[serde(default)]
    sites: Vec<Site>,
}

/// Site configurations persisted in a YAML file.
///
/// Every mutation is written through to disk before it returns.
#[derive(Debug)]
pub struct SiteStore {
    path: PathBuf,
    sites: Vec<Site>,
    next_id: u64,
}

impl SiteStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("Site file {} not found, starting empty", path.display());
            return Ok(Self {
                path: path.to_path_buf(),
                sites: Vec::new(),
                next_id: 1,
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse store content; `path` is where later mutations are written.
    pub fn parse<P: AsRef<Path>>(yaml: &str, path: P) -> Result<Self> {
        let file: SiteFile = if yaml.trim().is_empty() {
            SiteFile::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        let mut seen = HashSet::new();
        for site in &file.sites {
            site.validate()?;
            if !seen.insert(site.id.as_str()) {
                return Err(Error::Config(format!("duplicate site id '{}'", site.id)));
            }
        }

        let next_id = file
            .next_id
            .unwrap_or(1)
            .max(highest_id(&file.sites) + 1);
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            sites: file.sites,
            next_id,
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All sites, in creation order.
    pub fn list(&self) -> &[Site] {
        &self.sites
    }

    /// Look up a site by id.
    pub fn get(&self, id: &str) -> Option<&Site> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Look up a site by id, failing with [`Error::SiteNotFound`].
    pub fn resolve(&self, id: &str) -> Result<&Site> {
        self.get(id)
            .ok_or_else(|| Error::SiteNotFound(id.to_string()))
    }

    /// Validate and add a site. Ids are assigned sequentially and never reused.
    ///
    /// Nothing changes in memory unless the file write succeeds.
    pub fn create(&mut self, new: NewSite) -> Result<Site> {
        let default_iterations = new.default_iterations.unwrap_or_else(default_iterations);
        validate_fields(&new.name, &new.login_url, &new.vote_url, default_iterations)?;
        if let Some(ref labels) = new.labels {
            Labels::with_overrides(labels)?;
        }

        let site = Site {
            id: self.next_id.to_string(),
            name: new.name.trim().to_string(),
            login_url: new.login_url.trim().to_string(),
            vote_url: new.vote_url.trim().to_string(),
            default_iterations,
            labels: new.labels.filter(|l| !l.is_empty()),
        };
        let mut sites = self.sites.clone();
        sites.push(site.clone());
        self.save(&sites, self.next_id + 1)?;
        self.sites = sites;
        self.next_id += 1;
        info!("Created site {} ({})", site.id, site.name);
        Ok(site)
    }

    /// Remove a site by id and return it.
    ///
    /// Nothing changes in memory unless the file write succeeds.
    pub fn delete(&mut self, id: &str) -> Result<Site> {
        let pos = self
            .sites
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::SiteNotFound(id.to_string()))?;
        let mut sites = self.sites.clone();
        let site = sites.remove(pos);
        self.save(&sites, self.next_id)?;
        self.sites = sites;
        info!("Deleted site {} ({})", site.id, site.name);
        Ok(site)
    }

    /// Write `sites` to a sibling temp file, then rename over the target.
    fn save(&self, sites: &[Site], next_id: u64) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = SiteFile {
            next_id: Some(next_id),
            sites: sites.to_vec(),
        };
        let yaml = serde_yaml::to_string(&file)?;
        let tmp = self.path.with_extension("yaml.tmp");
        std::fs::write(&tmp, yaml)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!("Saved {} sites to {}", sites.len(), self.path.display());
        Ok(())
    }
}

/// Highest numeric id in use, 0 when there is none.
fn highest_id(sites: &[Site]) -> u64 {
    sites
        .iter()
        .filter_map(|s| s.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

fn validate_fields(name: &str, login_url: &str, vote_url: &str, iterations: u32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Config("site name is required".into()));
    }
    for (field, value) in [("login_url", login_url), ("vote_url", vote_url)] {
        Url::parse(value.trim())
            .map_err(|e| Error::Config(format!("{} '{}' is invalid: {}", field, value, e)))?;
    }
    if iterations == 0 {
        return Err(Error::Config(
            "default_iterations must be at least 1".into(),
        ));
    }
    Ok(())
}
