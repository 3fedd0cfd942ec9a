pub enum Command {
    Collections,
    Keys {
        collection: String,
    },
    Fetch {
        collection: String,
        fields: Vec<String>,
        sort: Vec<bool>,
        limit: u64,
        skip: u64,
        sessions: Vec<String>,
    },
    Count {
        collection: String,
        sessions: Vec<String>,
    },
    Sessions {
        level_key: String,
    },
    // Invoke a native function with a JSON array of arguments
    Call {
        function: String,
        args_json: String,
    },
}
