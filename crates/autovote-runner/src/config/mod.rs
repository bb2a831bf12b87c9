pub mod labels;
pub mod run;
pub mod sites;

pub use labels::{LabelOverrides, Labels};
pub use run::{RunConfig, Timings, SAFETY_CEILING};
pub use sites::{NewSite, Site, SiteStore};
