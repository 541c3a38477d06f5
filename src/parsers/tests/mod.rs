mod integration_tests;
mod text_parser_tests;
