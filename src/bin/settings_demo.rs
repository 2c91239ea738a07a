use nearbuy::settings::*;

// $ cargo run --bin settings_demo -- --settings=settings/release.toml
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = parse_settings(cli.settings.as_deref())?;
    println!("Loaded settings: {:#?}", settings);

    match settings.jwt.resolve_signing_key() {
        Ok(key) => println!("Signing key resolved ({} bytes)", key.len()),
        Err(e) => println!("Signing key missing: {e}"),
    }

    Ok(())
}
