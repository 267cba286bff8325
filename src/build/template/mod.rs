use anyhow::Result;
use handlebars::{
    no_escape, Context, Handlebars, Helper, Output, RenderContext, RenderError, RenderErrorReason,
};

pub const VERSION_INFO_TEMPLATE: &str = "version_info";

pub fn handlebars<'hb>() -> Result<Handlebars<'hb>> {
    let mut hb = Handlebars::new();

    let version_info = include_str!("./version_info.hbs");

    hb.set_strict_mode(true);
    hb.register_escape_fn(no_escape);
    hb.register_template_string(VERSION_INFO_TEMPLATE, version_info)?;

    hb.register_helper("py_str", Box::new(py_str_helper));

    Ok(hb)
}

/// Writes the parameter as the body of a single quoted Python string literal.
fn py_str_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    let param = h.param(0).and_then(|v| v.value().as_str()).ok_or(
        RenderErrorReason::ParamTypeMismatchForName(
            "py_str",
            "0".to_owned(),
            "str".to_owned(),
        ),
    )?;

    out.write(&escape_python(param))?;

    Ok(())
}

fn escape_python(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());

    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_escape_quotes_and_backslashes() {
        assert_eq!(escape_python(r"Nook's C:\dir"), r"Nook\'s C:\\dir");
    }

    #[test]
    fn should_escape_control_characters() {
        assert_eq!(escape_python("a\nb\tc"), "a\\nb\\tc");
    }

    #[test]
    fn should_register_version_info_template() {
        let hb = handlebars().unwrap();

        assert!(hb.has_template(VERSION_INFO_TEMPLATE));
    }
}
