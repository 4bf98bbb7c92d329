//! `boardsmith check` - validate an orders file offline

use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::engine::plan;
use crate::orders::Orders;
use crate::ui;

pub fn run(ctx: &Context, path: &Path) -> Result<()> {
    let orders = Orders::load(path)?;
    orders.validate()?;

    let steps = plan(&orders);
    if !ctx.quiet {
        ui::header(&format!("Orders: {}", path.display()));
        for step in &steps {
            ui::kv(&format!("#{} {}", step.order, step.board), step.command.key());
        }
        println!();
    }

    ui::success(&format!(
        "{} valid ({})",
        path.display(),
        ui::plural(steps.len(), "command")
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn quiet() -> Context {
        Context {
            verbose: 0,
            quiet: true,
            config: None,
        }
    }

    #[test]
    fn test_check_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"orders": [{"board": "A", "create_lists": ["Todo"]}]}"#)
            .unwrap();
        assert!(run(&quiet(), file.path()).is_ok());
    }

    #[test]
    fn test_check_reports_problems() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"orders": [{"create_lists": ["Todo"]}]}"#)
            .unwrap();
        let err = run(&quiet(), file.path()).unwrap_err();
        assert!(err.to_string().contains("problem(s) in orders"));
    }
}
