diesel::table! {
    run (id) {
        id -> BigInt,
        title -> Text,
        started_on -> Timestamp,
        completed_on -> Timestamp,
        miles -> Integer,
        location -> Text,
        version -> Nullable<Integer>,
    }
}
