use super::{
    actions::{ActionContext, Desktop},
    reduce, render, Action, Catalog, StepView,
};
use crate::github::AssetResolver;
use anyhow::Result;
use std::io::{BufRead, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Navigate(Action),
    Perform(usize),
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Finished,
    Quit,
}

/// Line based front end for the wizard.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Terminal { input, output }
    }

    pub async fn run<A, D>(&mut self, catalog: &Catalog, context: &ActionContext<A, D>) -> Result<Exit>
    where
        A: AssetResolver,
        D: Desktop,
    {
        let Some(mut state) = catalog.start() else {
            log::warn!("The setup wizard has no steps");
            return Ok(Exit::Finished);
        };

        loop {
            let view = render(&state, catalog);
            self.show(&view)?;

            let Some(command) = self.read_command(&view)? else {
                return Ok(Exit::Quit);
            };

            match command {
                Command::Quit => return Ok(Exit::Quit),
                Command::Navigate(action) => {
                    state = reduce(state, action);
                    if state.is_finished() {
                        writeln!(self.output, "Setup finished.")?;
                        return Ok(Exit::Finished);
                    }
                }
                Command::Perform(index) => {
                    let (tag, binding) = view.actions[index];
                    log::debug!("performing {}", tag);

                    match context.perform(binding).await {
                        Ok(outcome) => writeln!(self.output, "  {}", outcome)?,
                        Err(err) => {
                            log::error!("{} failed: {:#}", binding.label(), err);
                            writeln!(self.output, "  [!] {} failed", binding.label())?;
                        }
                    }
                }
            }
        }
    }

    fn show(&mut self, view: &StepView) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}: {}", view.header, view.title)?;
        writeln!(self.output)?;
        writeln!(self.output, "{}", view.body)?;

        if !view.actions.is_empty() {
            writeln!(self.output)?;
            for (number, (_, binding)) in view.actions.iter().enumerate() {
                writeln!(self.output, "  {}) {}", number + 1, binding.label())?;
            }
        }

        Ok(())
    }

    /// `None` once the input is closed.
    fn read_command(&mut self, view: &StepView) -> Result<Option<Command>> {
        loop {
            let mut choices = vec![format!("[n] {}", view.next_label)];
            if view.can_go_back {
                choices.push("[b] Back".to_owned());
            }
            choices.push("[q] Quit".to_owned());
            if !view.actions.is_empty() {
                choices.push(format!("[1-{}] action", view.actions.len()));
            }

            write!(self.output, "\n{}: ", choices.join("  "))?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            match parse(line.trim(), view) {
                Some(command) => return Ok(Some(command)),
                None => writeln!(self.output, "  [!] Unknown choice '{}'", line.trim())?,
            }
        }
    }
}

fn parse(input: &str, view: &StepView) -> Option<Command> {
    match input.to_lowercase().as_str() {
        "" | "n" | "next" | "f" | "finish" => Some(Command::Navigate(Action::Next)),
        "b" | "back" if view.can_go_back => Some(Command::Navigate(Action::Back)),
        "q" | "quit" => Some(Command::Quit),
        other => other
            .parse::<usize>()
            .ok()
            .filter(|number| (1..=view.actions.len()).contains(number))
            .map(|number| Command::Perform(number - 1)),
    }
}
