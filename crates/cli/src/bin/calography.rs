use anyhow::Result;

fn main() -> Result<()> {
    calography_cli::main_entry()
}
