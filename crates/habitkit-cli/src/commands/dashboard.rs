use habitkit_core::dashboard;
use habitkit_core::storage::HabitDb;

use crate::common;

pub fn run(user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let db = HabitDb::open()?;
    let user_id = common::resolve_user(user)?;
    let summary = dashboard::dashboard(&db, &user_id, common::today())?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
