fn main() -> anyhow::Result<()> {
    quake_report::run()
}
