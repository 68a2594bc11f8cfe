pub mod literature_search;
