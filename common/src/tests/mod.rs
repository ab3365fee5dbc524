mod test_fused_fix;
