mod feature_schema_tests;
