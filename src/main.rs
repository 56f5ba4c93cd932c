fn main() -> anyhow::Result<()> {
    trading_journal_lib::run()
}
