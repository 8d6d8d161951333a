use anyhow::Result;

fn main() -> Result<()> {
    calography_cli::cgviz_entry()
}
