mod sequencer_tests;
mod stress_tests;
