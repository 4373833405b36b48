use habitkit_core::completion;
use habitkit_core::storage::HabitDb;

use crate::common;

pub fn run(
    habit_id: String,
    date: Option<String>,
    amount: Option<u32>,
    note: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = HabitDb::open()?;
    let date = common::parse_date_arg(date.as_deref())?;
    let rt = common::runtime()?;

    let (entry, update) = rt.block_on(completion::complete_habit(
        &db,
        &habit_id,
        date,
        amount,
        note,
        common::today(),
    ))?;

    println!("{}", serde_json::to_string_pretty(&entry)?);
    println!("streak: {}", update.streak);
    Ok(())
}
