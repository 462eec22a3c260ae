use async_trait::async_trait;
use pkg_types::component::{Component, ComponentSource};
use pkg_types::validate::validate_git_url;
use pkg_types::ResourceKind;

use crate::error::{CheckError, InfrastructureError, Violation};
use crate::immutable::ImmutableFields;
use crate::validator::{Validator, check_name, conclude};
use crate::verdict::Verdict;

#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentValidator;

#[async_trait]
impl Validator for ComponentValidator {
    type Resource = Component;

    async fn validate_create(&self, new: &Component) -> Result<Verdict, InfrastructureError> {
        conclude(check_create(new))
    }

    async fn validate_update(
        &self,
        old: &Component,
        new: &Component,
    ) -> Result<Verdict, InfrastructureError> {
        conclude(check_update(old, new))
    }
}

fn check_create(component: &Component) -> Result<Vec<String>, CheckError> {
    let name = &component.metadata.name;
    check_name(ResourceKind::Component, name)?;

    match component.spec.source() {
        ComponentSource::Unset => Ok(vec![format!(
            "{}: no git or image source is set yet, the component is waiting for source detection",
            name
        )]),
        ComponentSource::Git(git) if git.url.is_empty() => Err(Violation::MissingSource {
            name: name.clone(),
        }
        .into()),
        ComponentSource::Git(git) => {
            check_git_url(&git.url)?;
            Ok(vec![])
        }
        ComponentSource::Image(_) => Ok(vec![]),
        // An empty git block next to an image is just an image source.
        ComponentSource::GitAndImage { git, .. } if git.url.is_empty() => Ok(vec![]),
        ComponentSource::GitAndImage { git, image } => {
            check_git_url(&git.url)?;
            Ok(vec![format!(
                "{}: both git source {} and container image {} are set",
                name, git.url, image
            )])
        }
    }
}

fn check_update(old: &Component, new: &Component) -> Result<Vec<String>, CheckError> {
    ImmutableFields::new()
        .field(
            "componentName",
            &old.spec.component_name,
            &new.spec.component_name,
        )
        .field("application", &old.spec.application, &new.spec.application)
        .set_once(
            "source.git",
            old.spec.source.git.as_ref(),
            new.spec.source.git.as_ref(),
        )
        .check()?;

    // Source detection may fill in the git source after creation.
    if let (None, Some(git)) = (old.spec.source.git.as_ref(), new.spec.source.git.as_ref()) {
        if !git.url.is_empty() {
            check_git_url(&git.url)?;
        }
    }
    Ok(vec![])
}

fn check_git_url(url: &str) -> Result<(), Violation> {
    validate_git_url(url)
        .map(|_| ())
        .map_err(Violation::InvalidGitUrl)
}
