use super::{BuildParameters, DataMapping};
use anyhow::Result;
use itertools::Itertools;
use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

/// Terminal prompts for the build metadata. An empty answer keeps the value
/// shown in brackets.
pub struct Form<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Form { input, output }
    }

    pub fn fill(&mut self, defaults: &BuildParameters) -> Result<BuildParameters> {
        writeln!(self.output, "Build metadata (press Enter to keep the value in brackets)")?;

        let project = self.ask("Project name", &defaults.project)?;
        let organization = self.ask("Organization", &defaults.organization)?;
        let description = self.ask("Description", &defaults.description)?;
        let repo_url = self.ask("Repository URL", &defaults.repo_url)?;
        let executable = self.ask("Executable name", &defaults.executable)?;
        let version = self.ask("Version (x.y.z or x.y.z.w)", &defaults.version)?;
        let entry = self.ask("Entry script", &defaults.entry.display().to_string())?;
        let icon = self.ask("Icon", &defaults.icon.display().to_string())?;
        let data = self.ask_data(&defaults.data)?;

        Ok(BuildParameters {
            project,
            organization,
            description,
            repo_url,
            executable,
            version,
            entry: PathBuf::from(entry),
            icon: PathBuf::from(icon),
            data,
        })
    }

    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        write!(self.output, "{} [y/N]: ", prompt)?;
        self.output.flush()?;

        let input = self.read_line()?.to_lowercase();

        Ok(input == "y" || input == "yes")
    }

    fn ask(&mut self, label: &str, default: &str) -> Result<String> {
        write!(self.output, "{} [{}]: ", label, default)?;
        self.output.flush()?;

        let input = self.read_line()?;

        if input.is_empty() {
            Ok(default.to_owned())
        } else {
            Ok(input)
        }
    }

    fn ask_data(&mut self, defaults: &[DataMapping]) -> Result<Vec<DataMapping>> {
        let current = defaults
            .iter()
            .map(|m| format!("{}={}", m.source.display(), m.destination))
            .join(", ");

        loop {
            let answer = self.ask("Data (source=destination, comma separated, '-' for none)", &current)?;

            if answer.trim() == "-" {
                return Ok(vec![]);
            }

            let parsed: Option<Vec<DataMapping>> = answer
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(DataMapping::parse)
                .collect();

            match parsed {
                Some(mappings) => return Ok(mappings),
                None => writeln!(self.output, "  [!] Use the form source=destination")?,
            }
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let mut input = String::new();
        let read = self.input.read_line(&mut input)?;

        if read == 0 {
            anyhow::bail!("input closed");
        }

        Ok(input.trim().to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn should_keep_defaults_on_empty_answers() -> Result<()> {
        let input = Cursor::new("\n".repeat(9));
        let mut output = vec![];
        let defaults = BuildParameters::default();

        let params = Form::new(input, &mut output).fill(&defaults)?;

        assert_eq!(params, defaults);
        assert!(String::from_utf8(output)?.contains("Project name [StreamNook]: "));
        Ok(())
    }

    #[test]
    fn should_take_answers_and_parse_data() -> Result<()> {
        let answers = [
            "Nook", "", "", "", "nook", "3.0.0", "app.py", "app.ico",
            "assets=assets, fonts=assets/fonts",
        ];
        let input = Cursor::new(answers.join("\n") + "\n");
        let mut output = vec![];

        let params = Form::new(input, &mut output).fill(&BuildParameters::default())?;

        assert_eq!(params.project, "Nook");
        assert_eq!(params.executable, "nook");
        assert_eq!(params.version, "3.0.0");
        assert_eq!(params.entry, PathBuf::from("app.py"));
        assert_eq!(
            params.data,
            vec![
                DataMapping::new("assets", "assets"),
                DataMapping::new("fonts", "assets/fonts"),
            ]
        );
        Ok(())
    }

    #[test]
    fn should_reprompt_invalid_data_and_allow_none() -> Result<()> {
        let input = Cursor::new(format!("{}bogus\n-\n", "\n".repeat(8)));
        let mut output = vec![];

        let params = Form::new(input, &mut output).fill(&BuildParameters::default())?;

        assert!(params.data.is_empty());
        assert!(String::from_utf8(output)?.contains("[!] Use the form source=destination"));
        Ok(())
    }

    #[test]
    fn should_fail_when_input_closes() {
        let mut output = vec![];

        let result = Form::new(Cursor::new(""), &mut output).fill(&BuildParameters::default());

        assert!(result.is_err());
    }

    #[test]
    fn should_confirm_only_on_yes() -> Result<()> {
        let mut output = vec![];
        let mut form = Form::new(Cursor::new("yes\nn\n"), &mut output);

        assert!(form.confirm("Retry?")?);
        assert!(!form.confirm("Retry?")?);
        Ok(())
    }
}
