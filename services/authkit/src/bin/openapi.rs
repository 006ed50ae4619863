use anyhow::Result;

// Print the OpenAPI spec for the HTTP surface, for docs pipelines and diffing.
fn main() -> Result<()> {
    let spec = authkit::api::openapi().to_pretty_json()?;
    println!("{spec}");
    Ok(())
}
