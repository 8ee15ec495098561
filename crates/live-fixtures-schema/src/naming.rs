//! Naming conventions used when an association leaves a column or table
//! name implicit.

use convert_case::{Case, Casing};

/// Foreign key column referencing `entity`, e.g. `DogCafe` -> `dog_cafe_id`.
pub fn foreign_key_for(entity: &str) -> String {
	format!("{}_id", entity.to_case(Case::Snake))
}

/// Default belongs-to column for an association called `name`.
pub fn belongs_to_key(name: &str) -> String {
	format!("{}_id", name)
}

/// Default companion type column for a polymorphic association.
pub fn polymorphic_type_key(name: &str) -> String {
	format!("{}_type", name)
}

/// Default join table for two tables: sorted lexically and joined by `_`.
pub fn join_table_for(left: &str, right: &str) -> String {
	if left <= right {
		format!("{}_{}", left, right)
	} else {
		format!("{}_{}", right, left)
	}
}

/// Table name for an entity that does not declare one.
///
/// Snake-cases the entity name and pluralizes the last word with the usual
/// English suffix rules. Irregular plurals must be declared explicitly.
///
/// # Examples
///
/// ```
/// use live_fixtures_schema::naming::table_name_for;
///
/// assert_eq!(table_name_for("DogCafe"), "dog_cafes");
/// assert_eq!(table_name_for("Category"), "categories");
/// ```
pub fn table_name_for(entity: &str) -> String {
	let snake = entity.to_case(Case::Snake);
	pluralize(&snake)
}

fn pluralize(word: &str) -> String {
	let ends_with_consonant_y = word.ends_with('y')
		&& !word
			.chars()
			.rev()
			.nth(1)
			.is_some_and(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'));
	if ends_with_consonant_y {
		format!("{}ies", &word[..word.len() - 1])
	} else if ["s", "x", "z", "ch", "sh"]
		.iter()
		.any(|suffix| word.ends_with(suffix))
	{
		format!("{}es", word)
	} else {
		format!("{}s", word)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("Author", "author_id")]
	#[case("DogCafe", "dog_cafe_id")]
	#[case("dog", "dog_id")]
	fn test_foreign_key_for(#[case] entity: &str, #[case] expected: &str) {
		assert_eq!(foreign_key_for(entity), expected);
	}

	#[rstest]
	fn test_join_table_is_order_independent() {
		assert_eq!(join_table_for("dogs", "cafes"), "cafes_dogs");
		assert_eq!(join_table_for("cafes", "dogs"), "cafes_dogs");
	}

	#[rstest]
	#[case("Book", "books")]
	#[case("Category", "categories")]
	#[case("Day", "days")]
	#[case("Box", "boxes")]
	#[case("Match", "matches")]
	#[case("DogCafe", "dog_cafes")]
	fn test_table_name_for(#[case] entity: &str, #[case] expected: &str) {
		assert_eq!(table_name_for(entity), expected);
	}
}
