//! Bundled preview records shown before the first network refresh.

use super::types::{Entity, EntityType};

type Record = (&'static str, &'static str, &'static [(&'static str, &'static str)]);

const FILMS: &[Record] = &[
  ("1", "A New Hope", &[("director", "George Lucas"), ("release_date", "1977-05-25")]),
  ("2", "The Empire Strikes Back", &[("director", "Irvin Kershner"), ("release_date", "1980-05-17")]),
  ("3", "Return of the Jedi", &[("director", "Richard Marquand"), ("release_date", "1983-05-25")]),
  ("4", "The Phantom Menace", &[("director", "George Lucas"), ("release_date", "1999-05-19")]),
  ("5", "Attack of the Clones", &[("director", "George Lucas"), ("release_date", "2002-05-16")]),
  ("6", "Revenge of the Sith", &[("director", "George Lucas"), ("release_date", "2005-05-19")]),
];

const PEOPLE: &[Record] = &[
  ("1", "Luke Skywalker", &[("height", "172"), ("birth_year", "19BBY")]),
  ("2", "C-3PO", &[("height", "167"), ("birth_year", "112BBY")]),
  ("3", "R2-D2", &[("height", "96"), ("birth_year", "33BBY")]),
  ("4", "Darth Vader", &[("height", "202"), ("birth_year", "41.9BBY")]),
  ("5", "Leia Organa", &[("height", "150"), ("birth_year", "19BBY")]),
  ("10", "Obi-Wan Kenobi", &[("height", "182"), ("birth_year", "57BBY")]),
];

const PLANETS: &[Record] = &[
  ("1", "Tatooine", &[("climate", "arid"), ("terrain", "desert")]),
  ("2", "Alderaan", &[("climate", "temperate"), ("terrain", "grasslands, mountains")]),
  ("3", "Yavin IV", &[("climate", "temperate, tropical"), ("terrain", "jungle, rainforests")]),
  ("4", "Hoth", &[("climate", "frozen"), ("terrain", "tundra, ice caves")]),
  ("5", "Dagobah", &[("climate", "murky"), ("terrain", "swamp, jungles")]),
];

const STARSHIPS: &[Record] = &[
  ("2", "CR90 corvette", &[("model", "CR90 corvette"), ("starship_class", "corvette")]),
  ("3", "Star Destroyer", &[("model", "Imperial I-class Star Destroyer"), ("starship_class", "Star Destroyer")]),
  ("10", "Millennium Falcon", &[("model", "YT-1300 light freighter"), ("starship_class", "Light freighter")]),
  ("12", "X-wing", &[("model", "T-65 X-wing"), ("starship_class", "Starfighter")]),
];

const VEHICLES: &[Record] = &[
  ("4", "Sand Crawler", &[("model", "Digger Crawler"), ("vehicle_class", "wheeled")]),
  ("6", "T-16 skyhopper", &[("model", "T-16 skyhopper"), ("vehicle_class", "repulsorcraft")]),
  ("7", "X-34 landspeeder", &[("model", "X-34 landspeeder"), ("vehicle_class", "repulsorcraft")]),
];

const SPECIES: &[Record] = &[
  ("1", "Human", &[("classification", "mammal"), ("language", "Galactic Basic")]),
  ("2", "Droid", &[("classification", "artificial"), ("language", "n/a")]),
  ("3", "Wookie", &[("classification", "mammal"), ("language", "Shyriiwook")]),
];

/// Preview records for a type; empty for types without bundled data.
pub fn preview_entities(entity_type: EntityType) -> Vec<Entity> {
  let records: &[Record] = match entity_type {
    EntityType::Films => FILMS,
    EntityType::People => PEOPLE,
    EntityType::Planets => PLANETS,
    EntityType::Starships => STARSHIPS,
    EntityType::Vehicles => VEHICLES,
    EntityType::Species => SPECIES,
    EntityType::Transports => &[],
  };

  records
    .iter()
    .map(|(uid, name, properties)| {
      properties.iter().fold(
        Entity::new(entity_type, *uid, *name),
        |entity, (key, value)| entity.with_property(key, *value),
      )
    })
    .collect()
}
