use super::{template, version::VersionTuple, BuildParameters};
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DESCRIPTOR_FILE_NAME: &str = "version_info.txt";

#[derive(Debug, Serialize)]
struct VersionDescriptor<'a> {
    tuple: String,
    version: String,
    company: &'a str,
    description: &'a str,
    internal_name: &'a str,
    original_filename: String,
    product_name: &'a str,
    copyright: String,
    comments: &'a str,
}

impl<'a> VersionDescriptor<'a> {
    fn new(params: &'a BuildParameters, version: &VersionTuple) -> Self {
        let company = if params.organization.is_empty() {
            params.project.as_str()
        } else {
            params.organization.as_str()
        };

        VersionDescriptor {
            tuple: version
                .as_array()
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            version: version.to_string(),
            company,
            description: &params.description,
            internal_name: &params.executable,
            original_filename: format!("{}.exe", params.executable),
            product_name: &params.project,
            copyright: format!("Copyright (c) {}", company),
            comments: &params.repo_url,
        }
    }
}

pub fn render(params: &BuildParameters, version: &VersionTuple) -> Result<String> {
    let hb = template::handlebars()?;
    let descriptor = VersionDescriptor::new(params, version);
    let rendered = hb.render(template::VERSION_INFO_TEMPLATE, &descriptor)?;
    Ok(rendered)
}

/// Renders the descriptor into `dir` and returns the written path.
pub fn write(params: &BuildParameters, version: &VersionTuple, dir: &Path) -> Result<PathBuf> {
    let data = render(params, version).context("Cannot render the version descriptor")?;

    let path = dir.join(DESCRIPTOR_FILE_NAME);
    fs::write(&path, data)
        .with_context(|| format!("Cannot write the version descriptor {}", path.display()))?;

    log::info!("Wrote version descriptor {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildParameters;
    use tempdir::TempDir;

    fn params() -> BuildParameters {
        BuildParameters {
            project: "StreamNook".to_owned(),
            organization: "Nook's Lab".to_owned(),
            description: "Viewer".to_owned(),
            repo_url: "https://github.com/example/streamnook".to_owned(),
            executable: "StreamNook".to_owned(),
            version: "2.3.1".to_owned(),
            ..BuildParameters::default()
        }
    }

    #[test]
    fn should_render_version_tuple_and_strings() -> Result<()> {
        let rendered = render(&params(), &VersionTuple::parse("2.3.1")?)?;

        assert!(rendered.contains("filevers=(2, 3, 1, 0)"));
        assert!(rendered.contains("prodvers=(2, 3, 1, 0)"));
        assert!(rendered.contains("StringStruct(u'FileVersion', u'2.3.1.0')"));
        assert!(rendered.contains("StringStruct(u'OriginalFilename', u'StreamNook.exe')"));
        assert!(rendered.contains("StringStruct(u'CompanyName', u'Nook\\'s Lab')"));
        assert!(rendered.contains("u'https://github.com/example/streamnook'"));
        Ok(())
    }

    #[test]
    fn should_fall_back_to_project_as_company() -> Result<()> {
        let mut params = params();
        params.organization.clear();

        let rendered = render(&params, &VersionTuple::parse("1.0.0.7")?)?;

        assert!(rendered.contains("StringStruct(u'CompanyName', u'StreamNook')"));
        assert!(rendered.contains("filevers=(1, 0, 0, 7)"));
        Ok(())
    }

    #[test]
    fn should_write_descriptor_file() -> Result<()> {
        let dir = TempDir::new("descriptor")?;

        let path = write(&params(), &VersionTuple::parse("2.3.1")?, dir.path())?;

        assert_eq!(path, dir.path().join(DESCRIPTOR_FILE_NAME));
        assert!(fs::read_to_string(path)?.starts_with("# UTF-8"));
        Ok(())
    }
}
