//! The `recallkit init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create recallkit.toml
    if std::path::Path::new("recallkit.toml").exists() {
        println!("recallkit.toml already exists, skipping.");
    } else {
        std::fs::write("recallkit.toml", SAMPLE_CONFIG)?;
        println!("Created recallkit.toml");
    }

    // Create example session
    std::fs::create_dir_all("sessions")?;
    let example_path = std::path::Path::new("sessions/example.toml");
    if example_path.exists() {
        println!("sessions/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SESSION)?;
        println!("Created sessions/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit recallkit.toml to choose where results go");
    println!("  2. Run: recallkit validate --session sessions/example.toml");
    println!("  3. Run: recallkit score --session sessions/example.toml");
    println!("  4. Run: recallkit summarize");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# recallkit configuration

# Where participant reports are written. ${VAR} references are expanded.
results_dir = "./results"

# Primacy/recency zone size for free-recall experiments.
# Leave unset to use a quarter of the list length.
# zone_size = 5

# Mean accuracy a list length must reach to count toward capacity.
capacity_threshold = 0.5

# Skip trials that cannot be scored instead of failing the session.
skip_invalid_trials = true

# text, json, markdown, or html
default_format = "text"
"#;

const EXAMPLE_SESSION: &str = r#"# One participant's finger-tapping session.
# Missing recall positions are written as '-'.

[session]
participant = "example"
experiment = "finger_tapping"
notes = "generated by recallkit init"

[[trials]]
condition = "control"
original = "BKMRTWX"
recalled = "BKMRTWX"

[[trials]]
condition = "control"
original = "CFHLNPS"
recalled = "CFHL-PS"

[[trials]]
condition = "tapping"
original = "DGJQVXZ"
recalled = "DGJ----"

[[trials]]
condition = "tapping"
original = "BCFKMTW"
recalled = "BCFKM--"
"#;
