use crate::constants::is_system_column;

/// Return a copy of `columns` without the environment-managed system columns.
///
/// Order of the kept columns is preserved and the input is left untouched.
pub fn remove_system_columns<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    columns
        .iter()
        .map(AsRef::as_ref)
        .filter(|column| !is_system_column(column))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_remove_system_cols() {
        let pretend_columns = vec![
            "Id",
            "Name",
            "Something__c",
            "IsDeleted",
            "CreatedDate",
            "CreatedById",
            "LastModifiedDate",
            "LastModifiedById",
            "SystemModstamp",
            "LastViewedDate",
            "LastReferencedDate",
            "SomethingElse__c",
        ];

        let kept = remove_system_columns(&pretend_columns);
        assert_eq!(kept, vec!["Id", "Name", "Something__c", "SomethingElse__c"]);
        assert_eq!(pretend_columns.len(), 12);
    }

    #[test]
    fn test_removal_is_idempotent() {
        let columns = vec!["SystemModstamp", "Name", "IsDeleted", "Id"];
        let once = remove_system_columns(&columns);
        let twice = remove_system_columns(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        let columns: Vec<String> = Vec::new();
        assert!(remove_system_columns(&columns).is_empty());
    }
}
