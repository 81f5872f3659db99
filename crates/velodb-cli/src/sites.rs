//! `velodb sites`: list the configured sites.

use velodb_core::sites::FieldSelectors;

pub(crate) fn run() -> anyhow::Result<()> {
    let config = velodb_core::load_app_config()?;
    let registry = velodb_core::load_sites(&config.sites_path)?;

    for site in &registry.sites {
        println!(
            "{:<12} {:<20} languages: {:<12} selectors: {}/10",
            site.key,
            site.name,
            site.languages.join(","),
            configured_selectors(&site.selectors),
        );
    }
    println!("{} site(s) configured", registry.sites.len());
    Ok(())
}

fn configured_selectors(s: &FieldSelectors) -> usize {
    [
        &s.name,
        &s.price,
        &s.description,
        &s.battery,
        &s.motor_type,
        &s.max_speed,
        &s.range,
        &s.weight,
        &s.max_load,
        &s.images,
    ]
    .iter()
    .filter(|selector| selector.is_some())
    .count()
}
