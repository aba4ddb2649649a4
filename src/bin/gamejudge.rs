use anyhow::Result;

fn main() -> Result<()> {
    gamejudge::cli::run()
}
