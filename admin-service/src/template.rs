//! HTML 模板渲染
//!
//! Templates are compiled into the binary. Values are escaped with the same
//! entity set as [`escape_html`], so `'` becomes `&#039;`. SQL shown in code
//! blocks goes through the `sql` filter, which leaves quotes alone.

use minijinja::{AutoEscape, Environment, Value};
use serde::Serialize;

use common::errors::{AppError, AppResult};
use common::utils::{escape_html, escape_text};

const TEMPLATES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../templates/layout.html")),
    ("message.html", include_str!("../templates/message.html")),
    ("preview_sql.html", include_str!("../templates/preview_sql.html")),
    ("indexes.html", include_str!("../templates/indexes.html")),
    (
        "sql/enum_dropdown.html",
        include_str!("../templates/sql/enum_dropdown.html"),
    ),
    (
        "sql/set_dropdown.html",
        include_str!("../templates/sql/set_dropdown.html"),
    ),
    (
        "sql/query_results.html",
        include_str!("../templates/sql/query_results.html"),
    ),
    (
        "relation/check_relations.html",
        include_str!("../templates/relation/check_relations.html"),
    ),
    (
        "table/search_form.html",
        include_str!("../templates/table/search_form.html"),
    ),
];

/// 模板引擎
pub struct Template {
    env: Environment<'static>,
}

impl Template {
    pub fn new() -> AppResult<Self> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_formatter(|out, state, value| {
            if value.is_undefined() || value.is_none() {
                return Ok(());
            }
            if state.auto_escape() != AutoEscape::None && !value.is_safe() {
                out.write_str(&escape_html(&value.to_string()))?;
            } else {
                write!(out, "{value}")?;
            }
            Ok(())
        });

        env.add_filter("sql", |text: String| Value::from_safe_string(escape_text(&text)));

        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| AppError::Template(format!("{name}: {e}")))?;
        }
        Ok(Self { env })
    }

    /// 渲染模板
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> AppResult<String> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| AppError::Template(e.to_string()))?;
        template
            .render(Value::from_serialize(&context))
            .map_err(|e| {
                tracing::error!(template = name, error = %e, "template rendering failed");
                AppError::Template(e.to_string())
            })
    }
}
