//! Params command: print the parameter table.

use anyhow::Result;

use needlepath::params::{ELEMENT_PARAMS, ParamKind, ParamSpec, SATIN_PARAMS};

fn kind_name(kind: ParamKind) -> String {
    match kind {
        ParamKind::Toggle => "toggle".to_string(),
        ParamKind::Boolean => "boolean".to_string(),
        ParamKind::Float => "float".to_string(),
        ParamKind::Int => "int".to_string(),
        ParamKind::SplitFloat => "float [float]".to_string(),
        ParamKind::Dropdown(options) => format!("one of {}", options.join("|")),
    }
}

fn print_table(title: &str, table: &[ParamSpec]) {
    println!("{}:", title);
    println!("  {:<40} {:<24} {:<8} {:<5} {}", "NAME", "TYPE", "DEFAULT", "UNIT", "GROUP");
    for spec in table {
        println!(
            "  {:<40} {:<24} {:<8} {:<5} {}",
            spec.name,
            kind_name(spec.kind),
            spec.default.unwrap_or("-"),
            spec.unit.unwrap_or(""),
            spec.group.unwrap_or("")
        );
    }
}

/// List every parameter an element can carry (as `data-<name>` in SVG).
pub fn cmd_params() -> Result<()> {
    print_table("Satin column", SATIN_PARAMS);
    println!();
    print_table("Every element", ELEMENT_PARAMS);
    Ok(())
}
