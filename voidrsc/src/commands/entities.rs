use crate::cli::EntitiesArgs;
use crate::error::{Error, Result};
use crate::util::{find_entry, open_container};

pub fn run(args: EntitiesArgs) -> Result<()> {
    let container = open_container(&args.archive)?;
    let index = find_entry(&container, &args.entry)?;
    let entry = &container.entries()[index];

    let entities = container
        .load_entities(entry)
        .map_err(|source| Error::LoadEntities {
            destination: entry.destination.clone(),
            source,
        })?;

    let value = match &args.id {
        Some(id) => entities
            .get(id)
            .ok_or_else(|| Error::EntityNotFound {
                id: id.clone(),
                destination: entry.destination.clone(),
            })?
            .to_json(),
        None => entities.to_json(),
    };

    let json = if args.compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    }
    .map_err(|source| Error::Serialize { source })?;

    println!("{}", json);
    Ok(())
}
