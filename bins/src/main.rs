use std::str::FromStr as _;

use academy::Academy;
use eyre::{eyre, Context};
use log::info;
use mongodb::bson::oid::ObjectId;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};

/// Acts for maintenance commands that are not tied to a real user.
const SYSTEM_ACTOR: [u8; 12] = [0; 12];

#[derive(EnumString, EnumIter, Display, Debug, Clone, Copy, PartialEq)]
#[strum(serialize_all = "snake_case")]
enum Command {
    Init,
    Stats,
    Instructors,
}

fn usage() -> String {
    let commands: Vec<String> = Command::iter().map(|cmd| cmd.to_string()).collect();
    format!("usage: academy-cli <{}>", commands.join("|"))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let env = env::Env::load()?;
    pretty_env_logger::formatted_builder()
        .parse_filters(env.rust_log())
        .init();
    color_eyre::install()?;

    let command = match std::env::args().nth(1) {
        Some(arg) => Command::from_str(&arg).map_err(|_| eyre!("{}", usage()))?,
        None => Command::Init,
    };

    info!("connecting to mongo");
    let storage = storage::Storage::new(env.mongo_url(), env.db_name())
        .await
        .context("Failed to create storage")?;
    let academy = Academy::new(storage);
    let mut session = academy
        .start_session(ObjectId::from_bytes(SYSTEM_ACTOR))
        .await?;

    match command {
        Command::Init => info!("collections and indexes are ready"),
        Command::Stats => {
            let courses = academy.courses.count(&mut session).await?;
            let sessions = academy.sessions.count(&mut session).await?;
            info!("courses: {}, sessions: {}", courses, sessions);
        }
        Command::Instructors => {
            for partner in academy.directory.instructors(&mut session).await? {
                info!("{} {}", partner.id, partner.name);
            }
        }
    }
    Ok(())
}
