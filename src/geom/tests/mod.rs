mod test_ribbon_basic;
