mod replay_test;
