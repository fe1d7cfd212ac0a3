mod actor_run_test;
